//! Text rendering of weather data for the assistant and summaries

use crate::models::{
    ConditionKind, CurrentConditions, ForecastEntry, ForecastSeries, ResolvedLocation,
};

/// Hours of forecast included in the assistant context
const CONTEXT_FORECAST_HOURS: i64 = 24;

pub fn condition_emoji(condition: ConditionKind) -> &'static str {
    match condition {
        ConditionKind::Clear => "☀️",
        ConditionKind::Clouds => "☁️",
        ConditionKind::Rain => "🌧️",
        ConditionKind::Drizzle => "🌦️",
        ConditionKind::Thunderstorm => "⛈️",
        ConditionKind::Snow => "❄️",
        ConditionKind::Atmosphere => "🌫️",
        ConditionKind::Unknown => "🌤️",
    }
}

/// Beaufort-style description of a wind speed in m/s
pub fn wind_description(speed_ms: f64) -> &'static str {
    match speed_ms {
        s if s < 0.3 => "Calm",
        s if s < 1.6 => "Light air",
        s if s < 3.4 => "Light breeze",
        s if s < 5.5 => "Gentle breeze",
        s if s < 8.0 => "Moderate breeze",
        s if s < 10.8 => "Fresh breeze",
        s if s < 13.9 => "Strong breeze",
        s if s < 17.2 => "High wind",
        s if s < 20.8 => "Gale",
        _ => "Storm",
    }
}

/// Comfort level from temperature (Celsius) and humidity
pub fn comfort_level(temperature_c: f64, humidity_pct: u8) -> &'static str {
    match temperature_c {
        t if t < 0.0 => "Very Cold",
        t if t < 10.0 => "Cold",
        t if t < 20.0 => "Cool",
        t if t <= 25.0 && humidity_pct <= 60 => "Comfortable",
        t if t <= 30.0 && humidity_pct <= 70 => "Warm",
        t if t <= 35.0 => "Hot",
        _ => "Very Hot",
    }
}

/// One-paragraph summary of current conditions
pub fn summary(current: &CurrentConditions) -> String {
    format!(
        "{} {} | {} (feels like {:.1}°C) | humidity {}% | {} {} | {} | {}",
        condition_emoji(current.condition),
        current.description,
        current.format_temperature(),
        current.feels_like_c,
        current.humidity_pct,
        wind_description(current.wind_speed_ms),
        current.format_wind(),
        current.format_pressure(),
        comfort_level(current.temperature_c, current.humidity_pct),
    )
}

/// Weather context handed to the assistant alongside a question
pub fn weather_context(
    location: &ResolvedLocation,
    current: &CurrentConditions,
    forecast: Option<&ForecastSeries>,
) -> String {
    let mut context = format!(
        "CURRENT WEATHER DATA for {}:\n\
         - Temperature: {:.1}°C (feels like {:.1}°C)\n\
         - Condition: {} - {}\n\
         - Humidity: {}%\n\
         - Wind: {:.1} m/s\n\
         - Pressure: {} hPa\n\
         - High/Low: {:.1}°C / {:.1}°C\n",
        location.display_name(),
        current.temperature_c,
        current.feels_like_c,
        current.condition,
        current.description,
        current.humidity_pct,
        current.wind_speed_ms,
        current.pressure_hpa,
        current.temp_max_c,
        current.temp_min_c,
    );
    if current.is_synthetic() {
        context.push_str("- Note: placeholder data, live weather was unavailable\n");
    }

    let upcoming = forecast.map_or(&[][..], |series| series.next_hours(CONTEXT_FORECAST_HOURS));
    if !upcoming.is_empty() {
        context.push_str("\nUPCOMING FORECAST:\n");
        for entry in upcoming {
            context.push_str(&forecast_line(entry));
        }
    }

    context
}

fn forecast_line(entry: &ForecastEntry) -> String {
    format!(
        "- {}: {:.1}°C, {}\n",
        entry.time.format("%m/%d %H:%M"),
        entry.temperature_c,
        entry.condition
    )
}
