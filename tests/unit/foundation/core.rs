use super::*;

#[test]
fn hex_colors_parse_with_and_without_alpha() {
    assert_eq!(
        Rgba8::from_hex("#FF4B00").unwrap(),
        Rgba8::rgb(0xFF, 0x4B, 0x00)
    );
    assert_eq!(
        Rgba8::from_hex("#00000080").unwrap(),
        Rgba8 {
            r: 0,
            g: 0,
            b: 0,
            a: 0x80
        }
    );
}

#[test]
fn hex_colors_reject_garbage() {
    assert!(Rgba8::from_hex("FF4B00").is_err());
    assert!(Rgba8::from_hex("#FF4B0").is_err());
    assert!(Rgba8::from_hex("#GG4B00").is_err());
}

#[test]
fn canvas_rgba_len() {
    let c = Canvas {
        width: 3,
        height: 2,
    };
    assert_eq!(c.rgba_len(), 24);
}
