// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use code_scanner::constants::{self, app_info, decoding, overlay};

#[test]
fn test_version_is_set() {
    assert!(!app_info::version().is_empty(), "Version should be embedded at build time");
}

#[test]
fn test_overlay_defaults() {
    assert_eq!(overlay::COLOR, [0, 255, 0], "Outlines should be green");
    assert!(overlay::THICKNESS >= 1);
    assert!(overlay::LABEL_OFFSET > 0, "Labels should sit above the symbol");
}

#[test]
fn test_hull_threshold_matches_quadrilateral() {
    // Four-corner polygons (QR finder bounds) are drawn as given
    assert_eq!(constants::HULL_VERTEX_THRESHOLD, 4);
}

#[test]
fn test_decoding_defaults_are_usable() {
    assert!(decoding::QR_MAX_DIMENSION >= 320);
    assert!(decoding::BARCODE_TRY_HARDER, "Rotated barcodes should be found by default");
}
