use super::*;

#[test]
fn fnv_is_stable_for_same_input() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"anados");
    let mut b = Fnv1a64::new_default();
    b.write_bytes(b"anados");
    assert_eq!(a.finish(), b.finish());

    let mut c = Fnv1a64::new_default();
    c.write_bytes(b"anadoS");
    assert_ne!(a.finish(), c.finish());
}

#[test]
fn fnv_empty_is_offset_basis() {
    assert_eq!(Fnv1a64::new_default().finish(), Fnv1a64::OFFSET_BASIS);
}

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(255, 0), 0);
    assert_eq!(mul_div255_u8(200, 128), 100);
}

#[test]
fn readback_rounding_policy() {
    assert_eq!(round_position(12.49), 12.0);
    assert_eq!(round_position(-3.6), -4.0);
    assert_eq!(round_rotation(33.333), 33.3);
    assert_eq!(round_rotation(-0.06), -0.1);
    assert_eq!(round_scale(1.23456), 1.235);
    assert_eq!(round_scale(0.9999), 1.0);
}

#[test]
fn readback_ties_round_toward_positive_infinity() {
    assert_eq!(round_position(2.5), 3.0);
    assert_eq!(round_position(-2.5), -2.0);
    assert_eq!(round_position(-0.5), 0.0);
    assert_eq!(round_rotation(-12.25), -12.2);
    assert_eq!(round_rotation(12.25), 12.3);
    assert_eq!(round_scale(-0.0625), -0.062);
}
