//! Thin façade over rank-to-rank broadcast.
//!
//! The import pipeline only needs one collective: the root rank broadcasting a
//! byte buffer to everybody else. Backends:
//! - [`NoComm`]: a single serial rank.
//! - [`ThreadComm`]: several ranks inside one process, one per thread.
//! - `MpiComm` (feature `mpi-support`): `MPI_Bcast` over the world communicator.
//!
//! Every rank must call `broadcast` the same number of times with the same root.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use dashmap::DashMap;

use crate::mesh_error::MeshError;

/// Collective communication interface.
pub trait Communicator {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Replaces `buf` on every non-root rank with the root's `buf`.
    fn broadcast(&self, root: usize, buf: &mut Vec<u8>) -> Result<(), MeshError>;

    fn is_root(&self, root: usize) -> bool {
        self.rank() == root
    }
}

fn check_root(root: usize, size: usize) -> Result<(), MeshError> {
    if root < size {
        Ok(())
    } else {
        Err(MeshError::Communication(format!(
            "root {root} out of range for {size} ranks"
        )))
    }
}

/// Compile-time no-op comm for pure serial use.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn broadcast(&self, root: usize, _buf: &mut Vec<u8>) -> Result<(), MeshError> {
        check_root(root, 1)
    }
}

// --- ThreadComm: intra-process ranks ---

#[derive(Debug)]
struct Slot {
    payload: Bytes,
    pending: usize,
}

/// One rank of an in-process group created by [`ThreadComm::group`].
#[derive(Debug)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
    mailbox: Arc<DashMap<u64, Slot>>,
    seq: AtomicU64,
}

impl ThreadComm {
    /// Creates `size` connected ranks; move each into its own thread.
    pub fn group(size: usize) -> Vec<ThreadComm> {
        let mailbox = Arc::new(DashMap::new());
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                size,
                mailbox: Arc::clone(&mailbox),
                seq: AtomicU64::new(0),
            })
            .collect()
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn broadcast(&self, root: usize, buf: &mut Vec<u8>) -> Result<(), MeshError> {
        check_root(root, self.size)?;
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        if self.size == 1 {
            return Ok(());
        }
        if self.rank == root {
            self.mailbox.insert(
                seq,
                Slot {
                    payload: Bytes::copy_from_slice(buf),
                    pending: self.size - 1,
                },
            );
            return Ok(());
        }
        loop {
            // The shard guard must be released before `remove_if` touches the same shard.
            let received = self.mailbox.get_mut(&seq).map(|mut slot| {
                slot.pending -= 1;
                slot.payload.clone()
            });
            if let Some(payload) = received {
                self.mailbox.remove_if(&seq, |_, slot| slot.pending == 0);
                buf.clear();
                buf.extend_from_slice(&payload);
                return Ok(());
            }
            std::thread::yield_now();
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    pub struct MpiComm {
        pub world: SimpleCommunicator,
        pub rank: usize,
        pub size: usize,
    }

    impl MpiComm {
        pub fn new(universe: &mpi::environment::Universe) -> Self {
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Self { world, rank, size }
        }
    }

    impl Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn broadcast(&self, root: usize, buf: &mut Vec<u8>) -> Result<(), MeshError> {
            check_root(root, self.size)?;
            let root_process = self.world.process_at_rank(root as i32);
            let mut len = buf.len() as u64;
            root_process.broadcast_into(&mut len);
            if self.rank != root {
                buf.resize(len as usize, 0);
            }
            root_process.broadcast_into(&mut buf[..]);
            Ok(())
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
