mod common;

use std::fs;

use issue_classifier::workflow;
use issue_classifier::{ModelError, ModelManager};

#[test]
fn test_model_save_and_load() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = common::prepared_config(dir.path())?;
    let training_data = workflow::load_issues(&config.paths.train_data)?;
    let (_, model) =
        workflow::build_and_train_model(&training_data, workflow::process_data(), &config, &mut std::io::sink())?;

    let manager = ModelManager::new(&config.paths.model);
    assert!(manager.is_model_saved());
    assert!(manager.verify_model()?);

    let (loaded, schema) = manager.load()?;
    assert_eq!(loaded, model);
    assert_eq!(schema, training_data.schema());
    Ok(())
}

#[test]
fn test_corrupted_model_fails_verification() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = common::prepared_config(dir.path())?;
    workflow::run(&config, &mut std::io::sink())?;

    let mut bytes = fs::read(&config.paths.model)?;
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&config.paths.model, bytes)?;

    let manager = ModelManager::new(&config.paths.model);
    assert!(!manager.verify_model()?);
    assert!(matches!(manager.load(), Err(ModelError::HashMismatch { .. })));
    Ok(())
}

#[test]
fn test_missing_model_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path().join("Models").join("model.bin"));

    assert!(!manager.is_model_saved());
    assert!(matches!(manager.load(), Err(ModelError::NotFound(_))));
    Ok(())
}

#[test]
fn test_remove_model() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = common::prepared_config(dir.path())?;
    workflow::run(&config, &mut std::io::sink())?;

    let manager = ModelManager::new(&config.paths.model);
    manager.remove_model()?;
    assert!(!manager.is_model_saved());
    Ok(())
}
