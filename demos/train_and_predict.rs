use chrono::NaiveDate;
use raincast::{
    synthetic_weather_frame, FeatureConfig, PredictRequest, RainPredictor, RaincastError,
    TrainOptions,
};
use std::env;
use std::path::Path;

/// Trains on `weatherAUS.csv` if a path is given, otherwise on synthetic data,
/// then saves the model to the default location and predicts a few days.
#[tokio::main]
async fn main() -> Result<(), RaincastError> {
    let config = FeatureConfig::default();
    let options = TrainOptions::default();

    let (predictor, report) = match env::args().nth(1) {
        Some(path) => RainPredictor::from_csv(Path::new(&path), config, options).await?,
        None => {
            let df = synthetic_weather_frame(5000, 42)?;
            RainPredictor::train(df, config, options).await?
        }
    };
    println!("{:#?}", report);

    predictor.save_default().await?;
    let predictor: RainPredictor = RainPredictor::load_default().await?;
    println!("{:#?}", predictor.summary());
    println!("Locations: {:?}", predictor.locations());

    let christmas = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
    for location in ["Sydney", "Melbourne", "Atlantis"] {
        let prediction = predictor.predict(christmas, location)?;
        println!(
            "{} {}: {} ({}, {})",
            prediction.date,
            prediction.location,
            prediction.prediction,
            prediction.confidence,
            prediction.interpretation()
        );
    }

    match predictor.predict_request(&PredictRequest::new("25/12/2025", "Sydney")) {
        Ok(prediction) => println!("{:?}", prediction),
        Err(e) if e.is_client_error() => println!("Rejected: {}", e),
        Err(e) => return Err(e),
    }

    Ok(())
}
