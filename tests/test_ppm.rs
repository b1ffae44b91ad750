use std::fs;

use ospray::bridge::{save_ppm, write_ppm};
use tempfile::TempDir;

#[test]
fn test_save_two_by_one() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frame.ppm");

    let rgba = [10u8, 20, 30, 255, 40, 50, 60, 255];
    save_ppm(&path, 2, 1, &rgba).unwrap();

    let mut expected = b"P6\n2 1\n255\n".to_vec();
    expected.extend_from_slice(&[10, 20, 30, 40, 50, 60]);
    expected.push(b'\n');
    assert_eq!(fs::read(&path).unwrap(), expected);
}

#[test]
fn test_rows_are_flipped() {
    // two rows of one pixel: native row 0 is the bottom of the image
    let rgba = [1u8, 1, 1, 0, 2, 2, 2, 0];
    let mut out = Vec::new();
    write_ppm(&mut out, 1, 2, &rgba).unwrap();

    let header = b"P6\n1 2\n255\n";
    assert_eq!(&out[..header.len()], header);
    assert_eq!(&out[header.len()..], &[2, 2, 2, 1, 1, 1, b'\n']);
}

#[test]
fn test_save_overwrites_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("frame.ppm");
    fs::write(&path, vec![0u8; 4096]).unwrap();

    save_ppm(&path, 1, 1, &[9, 8, 7, 6]).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"P6\n1 1\n255\n\x09\x08\x07\n");
}

#[test]
fn test_save_into_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("frame.ppm");
    assert!(save_ppm(&path, 1, 1, &[0, 0, 0, 0]).is_err());
}
