use async_trait::async_trait;
use image::{Rgb, RgbImage};
use sentinel::error::{Result, SentinelError};
use sentinel::hal::*;
use tempfile::tempdir;

struct RtspStub;

#[async_trait]
impl SourceDriver for RtspStub {
    fn driver_id(&self) -> &str {
        "rtsp-stub"
    }

    fn accepts(&self, uri: &SourceUri) -> bool {
        uri.scheme == "rtsp"
    }

    async fn open(&self, uri: &SourceUri) -> Result<Box<dyn FrameSource>> {
        Err(SentinelError::device_unavailable(format!("{} unreachable", uri)))
    }
}

#[test]
fn test_registry_register_and_list() {
    let mut registry = SourceRegistry::new();
    assert!(registry.list_drivers().is_empty());

    registry.register(RtspStub);
    assert_eq!(registry.list_drivers(), vec!["rtsp-stub".to_string()]);
    assert!(registry.resolve(&SourceUri::parse("rtsp://cam/1")).is_some());
    assert!(registry.resolve(&SourceUri::parse("sim://x")).is_none());
}

#[test]
fn test_defaults_cover_shipped_schemes() {
    let registry = SourceRegistry::with_defaults();
    let drivers = registry.list_drivers();
    assert!(drivers.contains(&"sim".to_string()));
    assert!(drivers.contains(&"offline".to_string()));
    assert!(drivers.contains(&"image-dir".to_string()));

    let resolve = |raw: &str| registry.resolve(&SourceUri::parse(raw)).map(|d| d.driver_id().to_string());
    assert_eq!(resolve("offline://").as_deref(), Some("offline"));
    assert_eq!(resolve("file:///srv/frames").as_deref(), Some("image-dir"));
    assert_eq!(resolve("rtsp://cam/1"), None);
}

#[tokio::test]
async fn test_open_failure_surfaces_as_device_unavailable() {
    let mut source = ManagedSource::new(std::sync::Arc::new(RtspStub), SourceUri::parse("rtsp://cam/1"));

    for attempt in 1..=3 {
        let err = source.next_frame().await.unwrap_err();
        assert!(matches!(err, SentinelError::DeviceUnavailable(_)));
        assert_eq!(source.open_attempts(), attempt);
        assert!(!source.is_open());
    }
}

#[tokio::test]
async fn test_image_directory_loops_in_order() {
    let dir = tempdir().unwrap();
    for (name, luma) in [("b.png", 200u8), ("a.png", 10u8)] {
        RgbImage::from_pixel(8, 8, Rgb([luma, luma, luma]))
            .save(dir.path().join(name))
            .unwrap();
    }
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let registry = SourceRegistry::with_defaults();
    let uri = SourceUri::parse(dir.path().to_str().unwrap());
    let mut source = ManagedSource::new(registry.resolve(&uri).unwrap(), uri);

    let lumas: Vec<u8> = {
        let mut out = Vec::new();
        for _ in 0..3 {
            out.push(source.next_frame().await.unwrap().image.get_pixel(0, 0)[0]);
        }
        out
    };
    assert_eq!(lumas, vec![10, 200, 10]);
}

#[tokio::test]
async fn test_empty_image_directory_is_unavailable() {
    let dir = tempdir().unwrap();
    let driver = ImageDirDriver::new();
    let uri = SourceUri::parse(dir.path().to_str().unwrap());

    let err = driver.open(&uri).await.err().unwrap();
    assert!(matches!(err, SentinelError::DeviceUnavailable(_)));
}

#[tokio::test]
async fn test_corrupt_image_fails_read() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();

    let uri = SourceUri::parse(dir.path().to_str().unwrap());
    let mut source = ManagedSource::new(std::sync::Arc::new(ImageDirDriver::new()), uri);

    let err = source.next_frame().await.unwrap_err();
    assert!(matches!(err, SentinelError::ReadFailed(_)));
    assert!(!source.is_open());
}

#[tokio::test]
async fn test_simulated_camera_parameters() {
    let uri = SourceUri::parse("sim://yard?width=40&height=30&activity_every=0");
    let mut handle = SimulatedCameraDriver::new().open(&uri).await.unwrap();

    let a = handle.read().await.unwrap();
    let b = handle.read().await.unwrap();
    assert_eq!((a.width(), a.height()), (40, 30));
    assert_eq!(b.sequence_id, a.sequence_id + 1);
    // No activity: the scene is static
    assert_eq!(a.image, b.image);
}
