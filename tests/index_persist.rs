use std::fs;

use anyhow::Result;
use imsim::{Metric, SearchError, SimilarityIndex};
use ndarray::{Array2, array};
use rstest::*;

fn sample(metric: Metric) -> SimilarityIndex {
    let matrix: Array2<f32> = array![
        [0.6, 0.8, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.6, 0.8, 0.0],
        [0.0, 0.6, 0.8],
    ];
    let keys = ["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"].map(String::from).to_vec();
    SimilarityIndex::new(matrix, keys, metric).unwrap()
}

#[rstest]
#[case::cosine(Metric::Cosine)]
#[case::euclidean(Metric::Euclidean)]
fn round_trip_gives_identical_results(#[case] metric: Metric) -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("features.bin");
    let tmp = dir.path().join("features.bin.tmp");

    let index = sample(metric);
    index.save_atomic(&path, &tmp)?;
    assert!(path.exists());
    assert!(!tmp.exists());

    let loaded = SimilarityIndex::load(&path)?;
    assert_eq!(loaded.metric(), metric);
    assert_eq!(loaded.keys(), index.keys());
    assert_eq!(loaded.dim(), 3);

    for query in [[0.6, 0.8, 0.0], [1.0, 0.0, 0.0], [0.1, 0.2, 0.9]] {
        assert_eq!(index.find_similar(&query, 5)?, loaded.find_similar(&query, 5)?);
    }
    Ok(())
}

#[test]
fn ties_keep_build_order_after_reload() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("features.bin");
    sample(Metric::Cosine).save(&path)?;

    let loaded = SimilarityIndex::load(&path)?;
    let result = loaded.find_similar(&[0.6, 0.8, 0.0], 2)?;
    assert_eq!(result[0].key, "a.jpg");
    assert_eq!(result[1].key, "d.jpg");
    Ok(())
}

#[test]
fn truncated_file_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("features.bin");
    sample(Metric::Cosine).save(&path)?;

    let bytes = fs::read(&path)?;
    fs::write(&path, &bytes[..bytes.len() / 2])?;
    let err = SimilarityIndex::load(&path).unwrap_err();
    assert!(matches!(err, SearchError::Serialization(_)));
    Ok(())
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SimilarityIndex::load(dir.path().join("nope.bin")).unwrap_err();
    assert!(matches!(err, SearchError::Io(_)));
}

#[test]
fn export_matches_matrix() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("features.npy");
    let index = sample(Metric::Euclidean);
    index.export_npy(&path)?;

    let array: Array2<f32> = ndarray_npy::read_npy(&path)?;
    assert_eq!(array, index.matrix());
    Ok(())
}
