//! Common test fixtures.
//!
//! Launch sites in the Bavarian Alps and Meteoblue `multimodel-1h` bodies
//! shaped like real responses.

use weather_common::{ForecastPayload, Site};

/// Well-known launch sites.
pub mod sites {
    /// (name, latitude, longitude, elevation)
    pub const BRAUNECK: (&str, f64, f64, i32) = ("Brauneck", 47.6633, 11.5247, 1555);
    pub const TEGELBERG: (&str, f64, f64, i32) = ("Tegelberg", 47.5606, 10.7764, 1707);
    pub const WANK: (&str, f64, f64, i32) = ("Wank", 47.5108, 11.1436, 1780);
}

/// A full three-step forecast for the Brauneck launch.
pub const METEOBLUE_FORECAST_JSON: &str = r#"{
  "metadata": {
    "modelrun_updatetime_utc": "2024-05-01 04:12",
    "name": "",
    "height": 1555,
    "timezone_abbrevation": "UTC",
    "latitude": 47.6633,
    "modelrun_utc": ["2024-05-01 00:00", "2024-05-01 00:00"],
    "models": ["NEMS4", "ICON-D2"],
    "gridpointelevation": [1490, 1512],
    "longitude": 11.5247,
    "utc_timeoffset": 0.0,
    "generation_time_ms": 12.83
  },
  "units": {
    "precipitation": "mm",
    "windspeed": "ms-1",
    "cloudcover": "percent",
    "time": "YYYY-MM-DD hh:mm",
    "temperature": "C",
    "winddirection": "degree"
  },
  "data_1h": {
    "time": ["2024-05-01 00:00", "2024-05-01 01:00", "2024-05-01 02:00"],
    "temperature_spread": [1.2, 1.4, null],
    "precipitation": [[0.0, 0.1, 0.0], [0.0, 0.0, 0.3]],
    "cloudcover": [[12, 40, 85], [10, 35, null]],
    "temperature": [[4.1, 3.8, 3.6], [4.4, 4.0, 3.9]],
    "winddirection": [[250, 260, 270], [245, 255, 265]]
  }
}"#;

/// The smallest body that still decodes as a forecast.
pub const MINIMAL_FORECAST_JSON: &str = r#"{"metadata":{"latitude":47.56,"longitude":10.78},"data_1h":{"time":["2024-05-01 00:00"]}}"#;

/// Valid JSON that is not a forecast (no `data_1h`).
pub const NOT_A_FORECAST_JSON: &str = r#"{"metadata":{"latitude":47.56,"longitude":10.78}}"#;

/// Decoded [`METEOBLUE_FORECAST_JSON`].
pub fn sample_payload() -> ForecastPayload {
    payload_from(METEOBLUE_FORECAST_JSON)
}

pub fn minimal_payload() -> ForecastPayload {
    payload_from(MINIMAL_FORECAST_JSON)
}

fn payload_from(json: &str) -> ForecastPayload {
    ForecastPayload::from_json(json).expect("fixture must decode")
}

/// Build a site from one of the [`sites`] tuples.
pub fn site(fixture: (&str, f64, f64, i32)) -> Site {
    let (name, latitude, longitude, elevation) = fixture;
    Site::new(name, latitude, longitude).with_elevation(elevation)
}

/// A site with no recorded elevation.
pub fn site_without_elevation(name: &str, latitude: f64, longitude: f64) -> Site {
    Site::new(name, latitude, longitude)
}

/// Brauneck, Tegelberg and Wank, in that order.
pub fn three_sites() -> Vec<Site> {
    vec![
        site(sites::BRAUNECK),
        site(sites::TEGELBERG),
        site(sites::WANK),
    ]
}
