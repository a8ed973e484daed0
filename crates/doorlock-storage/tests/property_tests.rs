//! Property-based tests for the credential slot and store addressing.

mod common;

use doorlock_core::Credential;
use doorlock_storage::{Verification, device_select};
use proptest::prelude::*;

fn digits() -> impl Strategy<Value = [u8; 5]> {
    prop::array::uniform5(0u8..=9)
}

proptest! {
    /// Property: provisioning C and then verifying C always matches.
    #[test]
    fn prop_provision_then_verify_matches(code in digits()) {
        let outcome = common::paused_runtime().block_on(async {
            let (mut slot, _handle, mut timer) = common::blank_slot();
            let credential = Credential::new(code).unwrap();
            slot.provision(&credential, &mut timer, common::SETTLE).await.unwrap();
            slot.verify(&code).await.unwrap()
        });
        prop_assert_eq!(outcome, Verification::Match);
    }

    /// Property: verifying C' != C reports the first differing position and
    /// reads no cell past it.
    #[test]
    fn prop_mismatch_reads_stop_at_first_difference(stored in digits(), candidate in digits()) {
        prop_assume!(stored != candidate);
        let first = stored
            .iter()
            .zip(candidate.iter())
            .position(|(a, b)| a != b)
            .unwrap();

        let (outcome, reads) = common::paused_runtime().block_on(async {
            let (mut slot, handle, _timer) = common::blank_slot();
            handle.load(0x0100, &stored);
            let outcome = slot.verify(&candidate).await.unwrap();
            (outcome, handle.read_log())
        });

        prop_assert_eq!(outcome, Verification::Mismatch { position: first });
        prop_assert_eq!(reads.len(), first + 1);
        prop_assert!(reads.iter().all(|&a| a <= 0x0100 + first as u16));
    }

    /// Property: the blank check reports a credential iff some cell is not
    /// the sentinel.
    #[test]
    fn prop_blank_check(cells in prop::array::uniform5(prop_oneof![Just(0xFFu8), 0u8..=9])) {
        let found = common::paused_runtime().block_on(async {
            let (mut slot, handle, _timer) = common::blank_slot();
            handle.load(0x0100, &cells);
            slot.has_credential().await.unwrap()
        });
        prop_assert_eq!(found, cells.iter().any(|&c| c != 0xFF));
    }

    /// Property: device select keeps the device nibble, carries A10..A8 in
    /// bits 3..1 and the direction in bit 0.
    #[test]
    fn prop_device_select_folding(address in 0u16..=0x07FF, read in any::<bool>()) {
        let select = device_select(0xA0, address, read);
        prop_assert_eq!(select & 0xF0, 0xA0);
        prop_assert_eq!(u16::from((select >> 1) & 0x07), address >> 8);
        prop_assert_eq!(select & 0x01 == 1, read);
    }
}
