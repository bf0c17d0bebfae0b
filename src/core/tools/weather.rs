//! Current-weather tools backed by the OpenWeatherMap REST API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{Tool, ToolError, ToolResult};
use crate::core::llm::ToolDefinition;

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub base_url: String,
    pub api_key: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEATHER_URL.to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MainReading {
    #[serde(default)]
    temp: f64,
    #[serde(default)]
    feels_like: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    main: MainReading,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    name: String,
    /// Numeric on success, sometimes a string on errors
    #[serde(default)]
    cod: Value,
}

impl WeatherResponse {
    fn code(&self) -> Option<i64> {
        match &self.cod {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Spoken-style summary of the reading
    fn to_report(&self) -> String {
        let mut report = if self.name.is_empty() {
            "为您播报的天气情况: ".to_string()
        } else {
            format!("为您播报{}的天气情况：", self.name)
        };
        if let Some(condition) = self.weather.first() {
            report.push_str(&format!("今天天气{}，", condition.description));
        }
        report.push_str(&format!(
            "当前温度{:.1}摄氏度, 体感: {:.1}摄氏度\n",
            self.main.temp, self.main.feels_like
        ));
        report
    }
}

/// HTTP client shared by both weather tools
pub struct WeatherClient {
    client: Client,
    config: WeatherConfig,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig) -> ToolResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ToolError::Execution(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub async fn by_city(&self, city: &str) -> ToolResult<String> {
        let location = format!("{city},cn");
        self.fetch(&[("q", location.as_str())]).await
    }

    pub async fn by_coordinates(&self, lat: f64, lon: f64) -> ToolResult<String> {
        let lat = lat.to_string();
        let lon = lon.to_string();
        self.fetch(&[("lat", lat.as_str()), ("lon", lon.as_str())])
            .await
    }

    async fn fetch(&self, query: &[(&str, &str)]) -> ToolResult<String> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(query)
            .query(&[("appid", self.config.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| ToolError::Execution(format!("weather request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Weather API returned {}: {}", status, body);
            return Err(ToolError::Execution(format!(
                "weather API returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let parsed: WeatherResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Execution(format!("failed to decode weather response: {e}")))?;

        match parsed.code() {
            Some(200) => {
                debug!("Weather lookup succeeded for {}", parsed.name);
                Ok(parsed.to_report())
            }
            code => Err(ToolError::Execution(format!(
                "weather API returned code {code:?}"
            ))),
        }
    }
}

/// `GetWeatherByCity{city}`
pub struct CityWeatherTool {
    client: Arc<WeatherClient>,
}

impl CityWeatherTool {
    pub fn new(client: Arc<WeatherClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CityWeatherTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "GetWeatherByCity".to_string(),
            description: "通过城市名称查询当前天气".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "city": {"type": "string", "description": "城市名称，如：北京市"}
                },
                "required": ["city"]
            }),
        }
    }

    async fn invoke(&self, arguments: &Value) -> ToolResult<String> {
        let city = arguments
            .get("city")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("city must be a string".to_string()))?;
        self.client.by_city(city.trim()).await
    }
}

/// `GetWeatherByCoordinates{lat, lon}`
pub struct CoordinatesWeatherTool {
    client: Arc<WeatherClient>,
}

impl CoordinatesWeatherTool {
    pub fn new(client: Arc<WeatherClient>) -> Self {
        Self { client }
    }
}

/// Models send coordinates both as numbers and as numeric strings
fn coordinate(arguments: &Value, key: &str) -> ToolResult<f64> {
    let value = arguments.get(key);
    value
        .and_then(Value::as_f64)
        .or_else(|| value.and_then(Value::as_str).and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| ToolError::InvalidArguments(format!("{key} must be a number")))
}

#[async_trait]
impl Tool for CoordinatesWeatherTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "GetWeatherByCoordinates".to_string(),
            description: "通过经纬度查询当前天气".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "lat": {"type": "number", "description": "纬度，例如：39.9042"},
                    "lon": {"type": "number", "description": "经度，例如：116.4074"}
                },
                "required": ["lat", "lon"]
            }),
        }
    }

    async fn invoke(&self, arguments: &Value) -> ToolResult<String> {
        let lat = coordinate(arguments, "lat")?;
        let lon = coordinate(arguments, "lon")?;
        self.client.by_coordinates(lat, lon).await
    }
}
