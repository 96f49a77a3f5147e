use anyhow::{Context, Result};
use log::info;
use serde_json::json;
use std::env;
use std::fs;

use meal_nutrition::nutrition_calculator::NutritionCalculator;
use meal_nutrition::nutrition_config::NutritionConfig;
use meal_nutrition::nutrition_model::RecognizedItem;
use meal_nutrition::reference_source::JsonFileSource;
use meal_nutrition::targets::{StaticTargetProvider, Trimester};

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    env_logger::init();

    info!("Starting meal nutrition calculation");

    let reference_path = env::var("REFERENCE_DB_PATH").context("REFERENCE_DB_PATH must be set")?;
    let meal_path = env::var("MEAL_PATH").context("MEAL_PATH must be set")?;

    let config = NutritionConfig::from_env()?;
    let source = JsonFileSource::new(&reference_path);
    let calculator = NutritionCalculator::from_source(&source, config)?;

    let meal_json = fs::read_to_string(&meal_path)
        .with_context(|| format!("Failed to read meal file {meal_path}"))?;
    let items: Vec<RecognizedItem> = serde_json::from_str(&meal_json)
        .with_context(|| format!("Failed to parse meal file {meal_path}"))?;

    let nutrition = calculator.calculate_nutrition(&items)?;
    info!("{nutrition}");

    // Balance is only reported when a targets file is configured
    let balance = match env::var("TARGETS_PATH") {
        Ok(targets_path) => {
            let trimester: Trimester = env::var("TRIMESTER")
                .unwrap_or_else(|_| "first".to_string())
                .parse()?;
            let provider = StaticTargetProvider::from_json_file(&targets_path)?;
            Some(calculator.evaluate_for_trimester(&nutrition.totals, &provider, trimester)?)
        }
        Err(_) => None,
    };

    let output = json!({
        "nutrition": nutrition,
        "balance": balance,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
