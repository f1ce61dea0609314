use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        DanmakuError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        DanmakuError::layer(9, 6)
            .to_string()
            .contains("invalid layer 9")
    );
    assert!(
        DanmakuError::from(SurfaceError::DeviceLost)
            .to_string()
            .contains("surface error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = DanmakuError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn device_lost_is_detected() {
    assert!(SurfaceError::DeviceLost.is_device_lost());
    assert!(!SurfaceError::failed("x").is_device_lost());
}
