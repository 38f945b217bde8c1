pub mod zip_server;

use std::io::{Cursor, Write};
use zip::write::FileOptions;

/// Builds a small dataset zip laid out like the real one: split/class/image.
pub fn dataset_zip() -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.add_directory("train/", FileOptions::default()).unwrap();
    for (name, body) in [
        ("train/pizza/001.jpg", b"pizza-1".as_slice()),
        ("train/steak/002.jpg", b"steak-2".as_slice()),
        ("test/sushi/003.jpg", b"sushi-3".as_slice()),
    ] {
        zip.start_file(name, FileOptions::default()).unwrap();
        zip.write_all(body).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Same layout, but the `train/` directory entry is stored read-only.
pub fn dataset_zip_readonly_dir() -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.add_directory("train/", FileOptions::default().unix_permissions(0o555))
        .unwrap();
    zip.start_file("train/pizza/001.jpg", FileOptions::default()).unwrap();
    zip.write_all(b"pizza-1").unwrap();
    zip.finish().unwrap().into_inner()
}
