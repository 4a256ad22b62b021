//! Database schema, applied statement by statement by `PgStore::migrate`.

pub(crate) const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS stations (
    station_id UUID PRIMARY KEY,
    locality_id VARCHAR(64) NOT NULL UNIQUE,
    locality_name TEXT NOT NULL,
    city_name TEXT NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    device_type VARCHAR(64)
);

CREATE TABLE IF NOT EXISTS measurement_runs (
    run_id UUID PRIMARY KEY,
    started_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_measurement_runs_started ON measurement_runs(started_at DESC);

CREATE TABLE IF NOT EXISTS readings_locality (
    reading_id UUID PRIMARY KEY,
    station_id UUID NOT NULL REFERENCES stations(station_id),
    run_id UUID NOT NULL REFERENCES measurement_runs(run_id),
    status VARCHAR(32),
    message TEXT,
    device_type INTEGER,
    temperature DOUBLE PRECISION,
    humidity DOUBLE PRECISION,
    wind_speed DOUBLE PRECISION,
    wind_direction DOUBLE PRECISION,
    rain_intensity DOUBLE PRECISION,
    rain_accumulation DOUBLE PRECISION,
    is_processed BOOLEAN NOT NULL DEFAULT FALSE,
    is_successful BOOLEAN NOT NULL DEFAULT FALSE,

    UNIQUE(run_id, station_id),
    CHECK (is_processed OR NOT is_successful)
);

CREATE INDEX IF NOT EXISTS idx_readings_locality_unprocessed
    ON readings_locality(run_id, station_id) WHERE NOT is_processed;

CREATE TABLE IF NOT EXISTS readings_coordinate (
    reading_id UUID PRIMARY KEY,
    station_id UUID NOT NULL REFERENCES stations(station_id),
    run_id UUID NOT NULL REFERENCES measurement_runs(run_id),
    latitude DOUBLE PRECISION,
    longitude DOUBLE PRECISION,
    timezone VARCHAR(64),
    timezone_offset BIGINT,
    observed_at BIGINT,
    sunrise BIGINT,
    sunset BIGINT,
    temperature DOUBLE PRECISION,
    feels_like DOUBLE PRECISION,
    pressure DOUBLE PRECISION,
    humidity DOUBLE PRECISION,
    dew_point DOUBLE PRECISION,
    uv_index DOUBLE PRECISION,
    clouds DOUBLE PRECISION,
    visibility BIGINT,
    wind_speed DOUBLE PRECISION,
    wind_direction DOUBLE PRECISION,
    wind_gust DOUBLE PRECISION,
    condition_id INTEGER,
    condition_main VARCHAR(64),
    condition_description TEXT,
    condition_icon VARCHAR(16),
    is_processed BOOLEAN NOT NULL DEFAULT FALSE,
    is_successful BOOLEAN NOT NULL DEFAULT FALSE,

    UNIQUE(run_id, station_id),
    CHECK (is_processed OR NOT is_successful)
);

CREATE INDEX IF NOT EXISTS idx_readings_coordinate_unprocessed
    ON readings_coordinate(run_id, station_id) WHERE NOT is_processed;

CREATE TABLE IF NOT EXISTS derived_temperatures (
    result_id UUID PRIMARY KEY,
    locality_reading_id UUID NOT NULL REFERENCES readings_locality(reading_id),
    coordinate_reading_id UUID NOT NULL REFERENCES readings_coordinate(reading_id),
    method VARCHAR(100) NOT NULL,
    dew_point DOUBLE PRECISION NOT NULL,
    wet_bulb DOUBLE PRECISION NOT NULL,
    computed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    UNIQUE(locality_reading_id, coordinate_reading_id)
)
"#;
