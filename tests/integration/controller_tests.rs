/*!
 * Controller and file workflow tests
 */

use doctran::app_controller::Controller;
use doctran::file_utils::FileManager;

use crate::common::{create_temp_dir, create_test_file, sample_analysis, test_config};

/// A default-configured controller reports itself initialized
#[test]
fn test_controller_withDefaultConfig_shouldBeInitialized() {
    let controller = Controller::new_for_test().unwrap();
    assert!(controller.is_initialized());
}

/// Running against a missing input file fails before any network work
#[tokio::test]
async fn test_run_withMissingInput_shouldFail() {
    let controller = Controller::with_config(test_config()).unwrap();
    let dir = create_temp_dir().unwrap();

    let result = controller
        .run(
            dir.path().join("does-not-exist.json"),
            dir.path().join("out"),
            false,
        )
        .await;

    assert!(result.is_err());
}

/// A directory without analysis files is rejected with a clear error
#[tokio::test]
async fn test_run_withEmptyDirectory_shouldFail() {
    let controller = Controller::with_config(test_config()).unwrap();
    let dir = create_temp_dir().unwrap();

    let result = controller
        .run(dir.path().to_path_buf(), dir.path().join("out"), false)
        .await;

    let message = result.unwrap_err().to_string();
    assert!(message.contains("No extractor analysis files"));
}

/// Output paths carry the target language and json extension
#[test]
fn test_generate_output_path_withTargetLanguage_shouldTagFilename() {
    let path = FileManager::generate_output_path("report.json", "out", "fr");
    assert_eq!(path, std::path::PathBuf::from("out/report.fr.json"));
}

/// Analysis discovery finds json files recursively and sorted
#[test]
fn test_find_analysis_files_withNestedDirs_shouldFindSorted() {
    let dir = create_temp_dir().unwrap();
    let root = dir.path().to_path_buf();
    let nested = root.join("nested");
    FileManager::ensure_dir(&nested).unwrap();

    let analysis_json = sample_analysis().to_json_string().unwrap();
    create_test_file(&root, "b.json", &analysis_json).unwrap();
    create_test_file(&nested, "a.json", &analysis_json).unwrap();
    create_test_file(&root, "notes.txt", "ignored").unwrap();

    let files = FileManager::find_analysis_files(&root).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.windows(2).all(|w| w[0] <= w[1]));
    assert!(files.iter().all(|f| f.extension().unwrap() == "json"));
}

/// Analysis files written by the boundary serializer load back through
/// the controller's input path
#[test]
fn test_analysis_fixture_withSerializedSample_shouldParse() {
    let dir = create_temp_dir().unwrap();
    let root = dir.path().to_path_buf();
    let path = create_test_file(
        &root,
        "sample.json",
        &sample_analysis().to_json_string().unwrap(),
    )
    .unwrap();

    let content = FileManager::read_to_string(&path).unwrap();
    let parsed = doctran::extraction::DocumentAnalysis::from_json_str(&content).unwrap();
    assert_eq!(parsed.figures.len(), 1);
    assert!(parsed.validate().is_ok());
}
