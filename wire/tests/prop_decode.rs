use proptest::prelude::*;
use wire::{
    decode_message, encode_input, encode_state, DecodeError, Limits, MessageKind, HEADER_SIZE,
    MAX_MESSAGE_SIZE,
};

use payload::{EntityId, InputPayload, MotionCurveSample, Quat, StatePayload, Tick, Vec2, Vec3};

fn encoded_state(tick: u64, x: f32) -> Vec<u8> {
    let state = StatePayload::new(Tick::new(tick), Vec3::new(x, 0.0, 0.0), Quat::IDENTITY);
    let mut buf = [0u8; MAX_MESSAGE_SIZE];
    let len = encode_state(EntityId::new(1), &state, &mut buf).unwrap();
    buf[..len].to_vec()
}

fn encoded_input(tick: u64, curve: bool) -> Vec<u8> {
    let mut input = InputPayload::new(Tick::new(tick), Vec2::X, Quat::IDENTITY);
    if curve {
        input = input.with_motion_curve(MotionCurveSample::new(0.5, Vec3::Z));
    }
    let mut buf = [0u8; MAX_MESSAGE_SIZE];
    let len = encode_input(EntityId::new(1), &input, &mut buf).unwrap();
    buf[..len].to_vec()
}

proptest! {
    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let _ = decode_message(&bytes, &Limits::default());
        let _ = decode_message(&bytes, &Limits::for_testing());
    }

    #[test]
    fn prop_truncation_is_rejected(tick in any::<u64>(), cut in 0usize..50) {
        let full = encoded_state(tick, 1.0);
        prop_assume!(cut < full.len());
        let err = decode_message(&full[..cut], &Limits::default()).unwrap_err();
        if cut < HEADER_SIZE {
            let is_too_small = matches!(err, DecodeError::PacketTooSmall { .. });
            prop_assert!(is_too_small);
        } else {
            let is_mismatch = matches!(err, DecodeError::PayloadLengthMismatch { .. });
            prop_assert!(is_mismatch);
        }
    }

    #[test]
    fn prop_single_byte_corruption_never_panics(
        curve in any::<bool>(),
        index in 0usize..MAX_MESSAGE_SIZE,
        value in any::<u8>(),
    ) {
        let mut bytes = encoded_input(42, curve);
        let index = index % bytes.len();
        bytes[index] = value;
        if let Ok(message) = decode_message(&bytes, &Limits::default()) {
            prop_assert_eq!(message.kind(), MessageKind::Input);
        }
    }

    #[test]
    fn prop_reserved_flag_bits_rejected(bit in 1u8..8) {
        let mut bytes = encoded_input(7, false);
        bytes[7] |= 1 << bit;
        let err = decode_message(&bytes, &Limits::default()).unwrap_err();
        let is_invalid_flags = matches!(err, DecodeError::InvalidFlags { .. });
        prop_assert!(is_invalid_flags);
    }
}

#[test]
fn every_malformed_class_maps_to_its_error() {
    let limits = Limits::default();
    let good = encoded_state(10, 2.0);

    let mut bad_magic = good.clone();
    bad_magic[0] ^= 0xFF;
    assert!(matches!(
        decode_message(&bad_magic, &limits),
        Err(DecodeError::InvalidMagic { .. })
    ));

    let mut bad_version = good.clone();
    bad_version[4] = 7;
    assert_eq!(
        decode_message(&bad_version, &limits),
        Err(DecodeError::UnsupportedVersion { found: 7 })
    );

    let mut bad_kind = good.clone();
    bad_kind[6] = 3;
    assert_eq!(
        decode_message(&bad_kind, &limits),
        Err(DecodeError::UnknownKind { found: 3 })
    );

    let mut extra = good.clone();
    extra.push(0);
    assert!(matches!(
        decode_message(&extra, &limits),
        Err(DecodeError::PayloadLengthMismatch { .. })
    ));

    let mut nan = good.clone();
    nan[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(&f32::NAN.to_bits().to_le_bytes());
    assert_eq!(
        decode_message(&nan, &limits),
        Err(DecodeError::NonFinite { field: "position" })
    );

    let oversized = vec![0u8; 65];
    assert!(matches!(
        decode_message(&oversized, &Limits::for_testing()),
        Err(DecodeError::LimitsExceeded { .. })
    ));

    assert!(decode_message(&good, &limits).is_ok());
}
