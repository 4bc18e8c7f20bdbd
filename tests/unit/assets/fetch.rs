use std::io::Cursor;

use base64::Engine as _;

use super::*;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 255, 0, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("adcanvas-fetch-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn scheme_detection() {
    assert!(has_scheme("ftp://host/x.png"));
    assert!(has_scheme("blob:abc"));
    assert!(!has_scheme("C:/images/x.png"));
    assert!(!has_scheme("images/x.png"));
}

#[test]
fn data_uris_base64_and_plain() {
    let b64 = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(b"hello")
    );
    assert_eq!(decode_data_uri(&b64).unwrap(), b"hello");
    assert_eq!(
        decode_data_uri("data:image/svg+xml,%3Csvg%3E").unwrap(),
        b"<svg>"
    );
    assert!(decode_data_uri("data:image/png;base64").is_err());
    assert!(decode_data_uri("data:,%zz").is_err());
}

#[tokio::test]
async fn resolves_data_uri_png() {
    let r = UriResolver::new(UriResolverOpts::default()).unwrap();
    let uri = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png_bytes(3, 2))
    );
    let img = r.resolve(&uri).await.unwrap();
    assert_eq!((img.width, img.height), (3, 2));
}

#[tokio::test]
async fn resolves_relative_and_file_uris() {
    let dir = scratch_dir("files");
    std::fs::create_dir_all(dir.join("img")).unwrap();
    std::fs::write(dir.join("img/logo.png"), png_bytes(5, 4)).unwrap();

    let r = UriResolver::new(UriResolverOpts {
        assets_root: dir.clone(),
        ..Default::default()
    })
    .unwrap();

    let img = r.resolve("img/logo.png").await.unwrap();
    assert_eq!((img.width, img.height), (5, 4));

    let abs = format!("file://{}", dir.join("img/logo.png").display());
    let img = r.resolve(&abs).await.unwrap();
    assert_eq!((img.width, img.height), (5, 4));

    assert!(matches!(
        r.resolve("img/missing.png").await.unwrap_err(),
        AssetError::NotFound(_)
    ));
    assert!(matches!(
        r.resolve("../escape.png").await.unwrap_err(),
        AssetError::UnsupportedUri(_)
    ));
}

#[tokio::test]
async fn rejects_unknown_schemes_and_oversized_assets() {
    let dir = scratch_dir("limits");
    std::fs::write(dir.join("big.png"), png_bytes(16, 16)).unwrap();

    let r = UriResolver::new(UriResolverOpts {
        assets_root: dir,
        max_bytes: 8,
        ..Default::default()
    })
    .unwrap();
    assert!(matches!(
        r.resolve("ftp://example.com/a.png").await.unwrap_err(),
        AssetError::UnsupportedUri(_)
    ));
    assert!(matches!(
        r.resolve("big.png").await.unwrap_err(),
        AssetError::Fetch(_)
    ));
}

#[tokio::test]
async fn undecodable_bytes_fail_to_decode() {
    let r = UriResolver::new(UriResolverOpts::default()).unwrap();
    assert!(matches!(
        r.resolve("data:text/plain,hello").await.unwrap_err(),
        AssetError::Decode(_)
    ));
}

#[test]
fn file_uri_paths_are_percent_decoded() {
    assert_eq!(
        file_uri_path("file:///tmp/a%20b.png").unwrap(),
        "/tmp/a b.png"
    );
    assert_eq!(
        file_uri_path("file://localhost/srv/x.png").unwrap(),
        "/srv/x.png"
    );
    assert!(matches!(
        file_uri_path("file:///tmp/%zz.png").unwrap_err(),
        AssetError::Decode(_)
    ));
    assert!(matches!(
        file_uri_path("file:///tmp/%ff.png").unwrap_err(),
        AssetError::UnsupportedUri(_)
    ));
}

#[tokio::test]
async fn resolves_escaped_file_uris() {
    let dir = scratch_dir("escaped");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("hero banner.png"), png_bytes(6, 2)).unwrap();

    let r = UriResolver::new(UriResolverOpts::default()).unwrap();
    let uri = format!("file://{}/hero%20banner.png", dir.display());
    let img = r.resolve(&uri).await.unwrap();
    assert_eq!((img.width, img.height), (6, 2));
}
