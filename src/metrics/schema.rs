//! Fixed metric schema of the heater measurement.
//!
//! Bump [`SCHEMA_VERSION`] whenever an entry is added, removed or renamed;
//! stored points are only comparable within one version.

use super::MetricSpec;

pub const SCHEMA_VERSION: u32 = 1;

pub const HEATER_MEASUREMENT: &str = "heater";

pub const HEATER_SCHEMA: &[MetricSpec] = &[
    // Heating circuit 0
    MetricSpec::text("circuit_active_program", "heating.circuits.0.operating.programs.active.value"),
    MetricSpec::text("circuit_active_mode", "heating.circuits.0.operating.modes.active.value"),
    MetricSpec::float("circuit_supply_temperature", "heating.circuits.0.sensors.temperature.supply.value"),
    MetricSpec::float("circuit_curve_shift", "heating.circuits.0.heating.curve.shift"),
    MetricSpec::float("circuit_curve_slope", "heating.circuits.0.heating.curve.slope"),
    MetricSpec::text("circuit_circulation_pump", "heating.circuits.0.circulation.pump.status"),
    // Domestic hot water
    MetricSpec::text("dhw_circulation_pump", "heating.dhw.pumps.circulation.status"),
    MetricSpec::boolean("dhw_active", "heating.dhw.active"),
    MetricSpec::boolean("dhw_one_time_charge", "heating.dhw.oneTimeCharge.active"),
    MetricSpec::float("dhw_hot_water_storage_temperature", "heating.dhw.sensors.temperature.hotWaterStorage.value"),
    MetricSpec::float("dhw_temperature", "heating.dhw.temperature.value"),
    MetricSpec::float("dhw_temperature_main", "heating.dhw.temperature.main.value"),
    // Sensors
    MetricSpec::float("outside_temperature", "heating.sensors.temperature.outside.value"),
    MetricSpec::float("supply_pressure", "heating.sensors.pressure.supply.value"),
    MetricSpec::float("volumetric_flow", "heating.sensors.volumetricFlow.return.value"),
    // Power consumption, current year
    MetricSpec::rounded("power_consumption_total_year", "heating.power.consumption.total.year.0", 1),
    MetricSpec::rounded("power_consumption_heating_year", "heating.power.consumption.heating.year.0", 1),
    MetricSpec::rounded("power_consumption_dhw_year", "heating.power.consumption.dhw.year.0", 1),
    // Burner
    MetricSpec::float("burner_modulation", "heating.burner.modulation.value"),
    MetricSpec::float("burner_hours", "heating.burner.statistics.hours"),
    MetricSpec::integer("burner_starts", "heating.burner.statistics.starts"),
    MetricSpec::boolean("burner_active", "heating.burner.active"),
    // Gas consumption, current year
    MetricSpec::rounded("gas_consumption_total_year", "heating.gas.consumption.total.year.0", 1),
    MetricSpec::rounded("gas_consumption_heating_year", "heating.gas.consumption.heating.year.0", 1),
    MetricSpec::rounded("gas_consumption_dhw_year", "heating.gas.consumption.dhw.year.0", 1),
    // Flue, heat production, boiler
    MetricSpec::float("flue_temperature", "heating.flue.sensors.temperature.main.value"),
    MetricSpec::rounded("heat_production_year", "heating.heat.production.year.0", 1),
    MetricSpec::float("boiler_temperature", "heating.boiler.temperature.value"),
    MetricSpec::float("boiler_common_supply_temperature", "heating.boiler.sensors.temperature.commonSupply.value"),
    // Error lists
    MetricSpec::count("errors_active_new_count", "heating.errors.active.entries.new"),
    MetricSpec::count("errors_active_current_count", "heating.errors.active.entries.current"),
    MetricSpec::count("errors_active_gone_count", "heating.errors.active.entries.gone"),
    MetricSpec::count("errors_history_new_count", "heating.errors.history.entries.new"),
    MetricSpec::count("errors_history_current_count", "heating.errors.history.entries.current"),
    MetricSpec::count("errors_history_gone_count", "heating.errors.history.entries.gone"),
];
