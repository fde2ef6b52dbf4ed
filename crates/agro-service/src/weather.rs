// Archivo: weather.rs
// Propósito: consulta meteorológica para una parcela. El proveedor real
// habla con una API compatible con Open-Meteo; en pruebas se usa uno fijo.
use crate::errors::{external, Result};
use agro_domain::DomainError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_WEATHER_API_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
  pub date: NaiveDate,
  pub temp_max: Option<f64>,
  pub temp_min: Option<f64>,
  pub precipitation_mm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
  pub latitude: f64,
  pub longitude: f64,
  pub temperature: f64,
  pub wind_speed: f64,
  pub weather_code: i32,
  pub daily: Vec<DailyForecast>,
}

pub fn validate_coordinates(lat: f64, lon: f64) -> Result<()> {
  if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
    return Err(DomainError::ValidationError(format!("Coordenadas fuera de rango: {}, {}", lat, lon)));
  }
  Ok(())
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
  async fn forecast(&self, lat: f64, lon: f64) -> Result<WeatherReport>;
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
  temperature: f64,
  windspeed: f64,
  weathercode: i32,
}

#[derive(Debug, Default, Deserialize)]
struct DailyBlock {
  #[serde(default)]
  time: Vec<NaiveDate>,
  #[serde(default)]
  temperature_2m_max: Vec<Option<f64>>,
  #[serde(default)]
  temperature_2m_min: Vec<Option<f64>>,
  #[serde(default)]
  precipitation_sum: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
  latitude: f64,
  longitude: f64,
  current_weather: CurrentWeather,
  #[serde(default)]
  daily: DailyBlock,
}

impl From<OpenMeteoResponse> for WeatherReport {
  fn from(r: OpenMeteoResponse) -> Self {
    let d = r.daily;
    let daily = d.time
                 .iter()
                 .enumerate()
                 .map(|(i, date)| DailyForecast { date: *date,
                                                  temp_max: d.temperature_2m_max.get(i).copied().flatten(),
                                                  temp_min: d.temperature_2m_min.get(i).copied().flatten(),
                                                  precipitation_mm: d.precipitation_sum.get(i).copied().flatten() })
                 .collect();
    WeatherReport { latitude: r.latitude,
                    longitude: r.longitude,
                    temperature: r.current_weather.temperature,
                    wind_speed: r.current_weather.windspeed,
                    weather_code: r.current_weather.weathercode,
                    daily }
  }
}

/// Parsea el cuerpo JSON de Open-Meteo.
pub fn parse_open_meteo(body: &str) -> Result<WeatherReport> {
  let parsed: OpenMeteoResponse =
    serde_json::from_str(body).map_err(|e| external("respuesta meteorológica inválida", e))?;
  Ok(parsed.into())
}

pub struct OpenMeteoProvider {
  client: Client,
  base_url: String,
}

impl OpenMeteoProvider {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(10))
                                  .build()
                                  .map_err(|e| external("cliente http", e))?;
    Ok(OpenMeteoProvider { client, base_url: base_url.into() })
  }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
  async fn forecast(&self, lat: f64, lon: f64) -> Result<WeatherReport> {
    validate_coordinates(lat, lon)?;
    let response = self.client
                       .get(&self.base_url)
                       .query(&[("latitude", lat.to_string()),
                                ("longitude", lon.to_string()),
                                ("current_weather", "true".to_string()),
                                ("daily", "temperature_2m_max,temperature_2m_min,precipitation_sum".to_string()),
                                ("timezone", "auto".to_string())])
                       .send()
                       .await
                       .map_err(|e| external("servicio meteorológico", e))?;
    if !response.status().is_success() {
      return Err(DomainError::ExternalError(format!("servicio meteorológico respondió {}", response.status())));
    }
    let body = response.text().await.map_err(|e| external("servicio meteorológico", e))?;
    parse_open_meteo(&body)
  }
}

/// Proveedor que siempre devuelve el mismo informe.
pub struct FixedWeatherProvider {
  report: WeatherReport,
}

impl FixedWeatherProvider {
  pub fn new(report: WeatherReport) -> Self {
    FixedWeatherProvider { report }
  }
}

#[async_trait]
impl WeatherProvider for FixedWeatherProvider {
  async fn forecast(&self, lat: f64, lon: f64) -> Result<WeatherReport> {
    validate_coordinates(lat, lon)?;
    Ok(WeatherReport { latitude: lat, longitude: lon, ..self.report.clone() })
  }
}
