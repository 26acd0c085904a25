//! Generator parameters and the text derived from them

use std::fmt;

/// Sensors that can be added on top of the ones the template already carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalSensor {
    Light,
    Pressure,
}

impl OptionalSensor {
    /// Fixed insertion and listing order.
    pub const ALL: [OptionalSensor; 2] = [OptionalSensor::Light, OptionalSensor::Pressure];

    /// Shared identifier of the container, sensor output and send rule.
    pub fn identifier(self) -> &'static str {
        match self {
            OptionalSensor::Light => "Light",
            OptionalSensor::Pressure => "Pressure",
        }
    }

    /// Value of the sensor input's `type` attribute.
    pub fn type_tag(self) -> &'static str {
        match self {
            OptionalSensor::Light => "light",
            OptionalSensor::Pressure => "pressure",
        }
    }
}

impl fmt::Display for OptionalSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Caller-supplied settings for one generated experiment.
///
/// Ranges (rate 1-100 Hz, interval 0.1-10 s) are checked by the caller;
/// the generator uses the values as given.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorParams {
    /// Broker address as `host:port`
    pub address: String,
    /// MQTT topic the experiment publishes to
    pub topic: String,
    /// Sensor sampling rate in Hz
    pub rate: u32,
    /// Network send interval in seconds
    pub interval: f64,
    /// Identifier used in the title and the download filename
    pub experiment_id: String,
    pub enable_light: bool,
    pub enable_pressure: bool,
}

impl GeneratorParams {
    /// Enabled optional sensors, light before pressure.
    pub fn enabled_sensors(&self) -> Vec<OptionalSensor> {
        OptionalSensor::ALL
            .into_iter()
            .filter(|sensor| match sensor {
                OptionalSensor::Light => self.enable_light,
                OptionalSensor::Pressure => self.enable_pressure,
            })
            .collect()
    }

    pub fn title(&self) -> String {
        format!("MQTT-Connect {}", self.experiment_id)
    }

    pub fn rate_string(&self) -> String {
        self.rate.to_string()
    }

    pub fn interval_string(&self) -> String {
        format_decimal(self.interval)
    }

    /// Single-line settings summary shown by the info view.
    pub fn info_label(&self) -> String {
        let mut parts = vec![
            format!("server={}", self.address),
            format!("topic={}", self.topic),
            format!("rate={}Hz", self.rate),
            format!("interval={}s", self.interval_string()),
        ];

        let sensors = self.enabled_sensors();
        if !sensors.is_empty() {
            let names: Vec<&str> = sensors.iter().map(|s| s.identifier()).collect();
            parts.push(format!("add_sensors=[{}]", names.join(", ")));
        }

        parts.join("; ")
    }

    /// Download filename, e.g. `mqtt_connector_011024-1530.phyphox`.
    pub fn file_name(&self) -> String {
        let id: String = self
            .experiment_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("mqtt_connector_{id}.phyphox")
    }
}

/// Decimal form that always carries a fractional part (`0.1`, `1.0`, `2.5`).
pub fn format_decimal(value: f64) -> String {
    let s = value.to_string();
    if value.is_finite() && !s.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
        format!("{s}.0")
    } else {
        s
    }
}
