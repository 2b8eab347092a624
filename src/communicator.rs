//! The transport used to combine partial results of different processes.
//! Only the contract lives here, together with a single-process
//! implementation; a message-passing backend plugs in behind the same trait.

use crate::error::*;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub trait Communicator: Sync {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn barrier(&self);

    /// Element-wise sum over all participants, result available everywhere.
    fn all_reduce_sum(&self, values: &mut [f64]);

    fn all_reduce_int_sum(&self, values: &mut [i64]);

    fn all_reduce_min(&self, values: &mut [f64]);

    fn all_reduce_max(&self, values: &mut [f64]);

    /// Overwrite `values` on every participant with those of `root`.
    fn broadcast(&self, values: &mut [f64], root: usize);

    /// Blocking point-to-point send.
    fn send(&self, values: &[f64], destination: usize, tag: u32) -> Result<()>;

    /// Blocking point-to-point receive into `values`.
    fn receive(&self, values: &mut [f64], source: usize, tag: u32)
        -> Result<()>;

    fn is_main_process(&self) -> bool {
        self.rank() == 0
    }
}

/// A run with exactly one participant. Reductions are the identity and
/// messages can only be sent to, and received from, rank 0.
#[derive(Debug, Default)]
pub struct SerialCommunicator {
    mailbox: Mutex<HashMap<u32, VecDeque<Vec<f64>>>>,
}

impl SerialCommunicator {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_peer(peer: usize) -> Result<()> {
        if peer != 0 {
            return Err(LatticeError::Network(format!(
                "rank {} does not exist in a serial run",
                peer
            ))
            .report());
        }
        Ok(())
    }
}

impl Communicator for SerialCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn all_reduce_sum(&self, _values: &mut [f64]) {}

    fn all_reduce_int_sum(&self, _values: &mut [i64]) {}

    fn all_reduce_min(&self, _values: &mut [f64]) {}

    fn all_reduce_max(&self, _values: &mut [f64]) {}

    fn broadcast(&self, _values: &mut [f64], root: usize) {
        assert_eq!(root, 0, "broadcast root {} out of range", root);
    }

    fn send(&self, values: &[f64], destination: usize, tag: u32) -> Result<()> {
        Self::check_peer(destination)?;
        let mut mailbox = self
            .mailbox
            .lock()
            .map_err(|e| LatticeError::Network(e.to_string()).report())?;
        mailbox.entry(tag).or_default().push_back(values.to_vec());
        Ok(())
    }

    fn receive(
        &self,
        values: &mut [f64],
        source: usize,
        tag: u32,
    ) -> Result<()> {
        Self::check_peer(source)?;
        let mut mailbox = self
            .mailbox
            .lock()
            .map_err(|e| LatticeError::Network(e.to_string()).report())?;
        let message =
            mailbox.get_mut(&tag).and_then(|q| q.pop_front()).ok_or_else(
                || {
                    LatticeError::Network(format!(
                        "no pending message with tag {}",
                        tag
                    ))
                    .report()
                },
            )?;
        if message.len() != values.len() {
            return Err(LatticeError::Network(format!(
                "message of length {} received into buffer of length {}",
                message.len(),
                values.len()
            ))
            .report());
        }
        values.copy_from_slice(&message);
        Ok(())
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn serial_reduce_test() {
        let comm = SerialCommunicator::new();
        let mut v = [1.0, 2.0];
        comm.all_reduce_sum(&mut v);
        comm.all_reduce_max(&mut v);
        assert_eq!(v, [1.0, 2.0]);
        assert!(comm.is_main_process());
        assert_eq!(comm.size(), 1);
    }

    #[test]
    fn serial_send_receive_test() {
        let comm = SerialCommunicator::new();
        comm.send(&[1.0, 2.0, 3.0], 0, 7).unwrap();
        let mut out = [0.0; 3];
        comm.receive(&mut out, 0, 7).unwrap();
        assert_eq!(out, [1.0, 2.0, 3.0]);

        let e = comm.receive(&mut out, 0, 7).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Network);
        assert!(comm.send(&[1.0], 3, 0).is_err());
    }
}
