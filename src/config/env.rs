use super::HeatwatchConfig;

impl HeatwatchConfig {
    /// Apply environment overrides on top of file/default values.
    ///
    /// Recognised: HEATWATCH_DEVICE_URL, HEATWATCH_DEVICE_TOKEN,
    /// HEATWATCH_INFLUX_URL, HEATWATCH_INFLUX_TOKEN, HEATWATCH_INFLUX_ORG,
    /// HEATWATCH_INFLUX_BUCKET.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("HEATWATCH_DEVICE_URL") {
            self.device.status_url = v;
        }
        if let Some(v) = lookup("HEATWATCH_DEVICE_TOKEN") {
            self.device.access_token = Some(v);
        }
        if let Some(v) = lookup("HEATWATCH_INFLUX_URL") {
            self.storage.url = v;
        }
        if let Some(v) = lookup("HEATWATCH_INFLUX_TOKEN") {
            self.storage.token = Some(v);
        }
        if let Some(v) = lookup("HEATWATCH_INFLUX_ORG") {
            self.storage.org = v;
        }
        if let Some(v) = lookup("HEATWATCH_INFLUX_BUCKET") {
            self.storage.bucket = v;
        }
    }
}
