mod common;

use ndarray::Array3;

use darkmaker_core::error::DarkMakerError;
use darkmaker_core::frame::{Frame, FrameType, MasterFrame, MasterMetadata};
use darkmaker_core::io::fits::{write_master, FitsReader};
use darkmaker_core::io::{scan_descriptors, FitsStore, FrameStore};

use common::write_dark_fits;

/// Primary header from raw 80-column cards, padded to one block, no data.
fn raw_header(cards: &[&str]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for card in cards.iter().chain(std::iter::once(&"END")) {
        bytes.extend_from_slice(format!("{card:<80}").as_bytes());
    }
    bytes.resize(2880, b' ');
    bytes
}

fn sample_master(frame: Frame) -> MasterFrame {
    MasterFrame {
        frame,
        metadata: MasterMetadata {
            frame_type: FrameType::Dark,
            exposure: 30.0,
            temperature: -10.5,
            filter: "Luminance".into(),
            binning: 2,
            description: "Master Dark MEDIAN combined".into(),
        },
    }
}

#[test]
fn test_master_round_trip_values_and_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("master.fits");
    let data = Array3::from_shape_vec((1, 2, 3), vec![0.0, 1.4, 1.6, 32768.0, 65535.0, 1200.0])
        .unwrap();
    write_master(&path, &sample_master(Frame::new(data))).unwrap();

    let reader = FitsReader::open(&path).unwrap();
    let frame = reader.read_frame().unwrap();
    assert_eq!(
        frame.data.iter().copied().collect::<Vec<f32>>(),
        vec![0.0, 1.0, 2.0, 32768.0, 65535.0, 1200.0]
    );

    assert_eq!(reader.text_key("IMAGETYP").as_deref(), Some("Dark Frame"));
    assert_eq!(reader.integer_key("BITPIX"), Some(16));
    assert_eq!(reader.shape(), (1, 2, 3));

    let descriptor = reader.descriptor().unwrap();
    assert_eq!(descriptor.width(), 3);
    assert_eq!(descriptor.height(), 2);
    assert_eq!(descriptor.binning(), 2);
    assert_eq!(descriptor.exposure(), 30.0);
    assert_eq!(descriptor.temperature(), -10.5);
    assert_eq!(descriptor.filter(), "Luminance");
    assert_eq!(descriptor.frame_type(), FrameType::Dark);
}

#[test]
fn test_writer_limits_out_of_range_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clamped.fits");
    let data = Array3::from_shape_vec((1, 1, 2), vec![-20.0, 70000.0]).unwrap();
    write_master(&path, &sample_master(Frame::new(data))).unwrap();

    let frame = FitsStore.read_frame(&path).unwrap();
    assert_eq!(frame.data[[0, 0, 0]], 0.0);
    assert_eq!(frame.data[[0, 0, 1]], 65535.0);
}

#[test]
fn test_multi_layer_master_keeps_layers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("color.fits");
    let data = Array3::from_shape_fn((3, 4, 5), |(l, r, c)| (l * 100 + r * 10 + c) as f32);
    write_master(&path, &sample_master(Frame::new(data.clone()))).unwrap();

    let frame = FitsStore.read_frame(&path).unwrap();
    assert_eq!(frame.layers(), 3);
    assert_eq!(frame.data, data);
}

#[test]
fn test_file_size_is_block_aligned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aligned.fits");
    write_dark_fits(&path, Frame::new(Array3::zeros((1, 7, 9))), 10.0, 0.0, "");
    let len = std::fs::metadata(&path).unwrap().len();
    assert_eq!(len % 2880, 0);
}

#[test]
fn test_missing_file_is_file_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.fits");
    let err = scan_descriptors(&FitsStore, &[missing.clone()]).unwrap_err();
    assert!(matches!(err, DarkMakerError::FileNotFound(p) if p == missing));
}

#[test]
fn test_non_fits_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.fits");
    std::fs::write(&path, vec![b'x'; 3000]).unwrap();
    assert!(matches!(
        FitsReader::open(&path),
        Err(DarkMakerError::InvalidFits(_))
    ));
}

#[test]
fn test_oversized_axes_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.fits");
    std::fs::write(
        &path,
        raw_header(&[
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    3",
            "NAXIS1  =           4294967296",
            "NAXIS2  =           4294967296",
            "NAXIS3  =           4294967296",
        ]),
    )
    .unwrap();

    assert!(matches!(
        FitsReader::open(&path),
        Err(DarkMakerError::InvalidFits(_))
    ));
    assert!(matches!(
        FitsStore.read_frame(&path),
        Err(DarkMakerError::InvalidFits(_))
    ));
}

#[test]
fn test_header_without_data_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.fits");
    std::fs::write(
        &path,
        raw_header(&[
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    2",
            "NAXIS1  =                   64",
            "NAXIS2  =                   64",
        ]),
    )
    .unwrap();

    let err = FitsStore.read_descriptor(&path).unwrap_err();
    assert!(matches!(err, DarkMakerError::InvalidFits(ref reason) if reason.contains("truncated")));
}

#[test]
fn test_non_ascii_filter_is_written_as_ascii() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("halpha.fits");
    write_dark_fits(&path, common::flat_frame(2, 2, 500.0), 60.0, -5.0, "H\u{3b1}");

    assert_eq!(std::fs::metadata(&path).unwrap().len() % 2880, 0);
    let descriptor = FitsStore.read_descriptor(&path).unwrap();
    assert_eq!(descriptor.filter(), "H?");
    assert_eq!(descriptor.exposure(), 60.0);
    assert_eq!(FitsStore.read_frame(&path).unwrap().data[[0, 1, 1]], 500.0);
}

#[test]
fn test_long_filter_is_cut_to_one_card() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.fits");
    let filter = format!("{}\u{3b1}\u{3b2}\u{3b3}", "a".repeat(66));
    write_dark_fits(&path, common::flat_frame(2, 2, 10.0), 30.0, -10.0, &filter);

    let descriptor = FitsStore.read_descriptor(&path).unwrap();
    assert_eq!(descriptor.filter(), format!("{}??", "a".repeat(66)));
    assert_eq!(descriptor.temperature(), -10.0);
}

#[test]
fn test_list_frames_filters_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.fit", "a.fits", "c.txt"] {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }
    let listed = FitsStore.list_frames(dir.path()).unwrap();
    assert_eq!(listed, vec![dir.path().join("a.fits"), dir.path().join("b.fit")]);
}
