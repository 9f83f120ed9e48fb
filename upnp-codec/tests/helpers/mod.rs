//! Test helpers for fixture-based codec tests
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone};
use proptest::prelude::*;
use upnp_codec::CodecError;
use upnp_model::{
    ActionDescriptor, ArgumentSpec, Datatype, EventSequence, IncomingEventRequest,
    ServiceDescriptor, StateVariable, Value,
};

pub const AV_TRANSPORT: &str = "urn:schemas-upnp-org:service:AVTransport:1";
pub const RENDERING_CONTROL: &str = "urn:schemas-upnp-org:service:RenderingControl:1";
pub const SENSOR: &str = "urn:schemas-upnp-org:service:X_Sensor:1";

/// Arguments and state variables of the sensor service, one per datatype
/// that is not a string or an integer
pub const TYPED_VARIABLES: [(&str, Datatype); 10] = [
    ("Reading", Datatype::R4),
    ("Average", Datatype::R8),
    ("Drift", Datatype::Float),
    ("Unit", Datatype::Char),
    ("Snapshot", Datatype::BinBase64),
    ("Checksum", Datatype::BinHex),
    ("CalibrationDate", Datatype::Date),
    ("LastSample", Datatype::DateTime),
    ("LastSync", Datatype::DateTimeTz),
    ("DailyReset", Datatype::Time),
];

/// Load a body captured from a device out of the fixtures directory
pub fn load_fixture(path: &str) -> String {
    let mut full = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    full.push("tests/fixtures");
    full.push(path);

    fs::read_to_string(&full).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", path, e))
}

/// The subset of AVTransport:1 the fixtures exercise
pub fn av_transport() -> Arc<ServiceDescriptor> {
    Arc::new(
        ServiceDescriptor::new(AV_TRANSPORT)
            .with_state_variable(StateVariable::new("LastChange", Datatype::String))
            .with_state_variable(StateVariable::new("CurrentPlayMode", Datatype::String))
            .with_state_variable(
                StateVariable::new("AbsoluteCounterPosition", Datatype::I4).without_events(),
            )
            .with_action(
                ActionDescriptor::new(AV_TRANSPORT, "SetAVTransportURI")
                    .with_input(ArgumentSpec::input("InstanceID", Datatype::Ui4))
                    .with_input(ArgumentSpec::input("CurrentURI", Datatype::String))
                    .with_input(ArgumentSpec::input("CurrentURIMetaData", Datatype::String)),
            )
            .with_action(
                ActionDescriptor::new(AV_TRANSPORT, "GetPositionInfo")
                    .with_input(ArgumentSpec::input("InstanceID", Datatype::Ui4))
                    .with_output(ArgumentSpec::output("Track", Datatype::Ui4))
                    .with_output(ArgumentSpec::output("TrackDuration", Datatype::String))
                    .with_output(ArgumentSpec::output("TrackMetaData", Datatype::String))
                    .with_output(ArgumentSpec::output("TrackURI", Datatype::String))
                    .with_output(ArgumentSpec::output("RelTime", Datatype::String))
                    .with_output(ArgumentSpec::output("AbsTime", Datatype::String))
                    .with_output(ArgumentSpec::output("RelCount", Datatype::I4))
                    .with_output(ArgumentSpec::output("AbsCount", Datatype::I4)),
            )
            .with_action(
                ActionDescriptor::new(AV_TRANSPORT, "Seek")
                    .with_input(ArgumentSpec::input("InstanceID", Datatype::Ui4))
                    .with_input(ArgumentSpec::input("Unit", Datatype::String))
                    .with_input(ArgumentSpec::input("Target", Datatype::String)),
            ),
    )
}

/// The subset of RenderingControl:1 the fixtures exercise
pub fn rendering_control() -> Arc<ServiceDescriptor> {
    Arc::new(
        ServiceDescriptor::new(RENDERING_CONTROL)
            .with_state_variable(StateVariable::new("LastChange", Datatype::String))
            .with_state_variable(StateVariable::new("Volume", Datatype::Ui2))
            .with_state_variable(StateVariable::new("Mute", Datatype::Boolean))
            .with_action(
                ActionDescriptor::new(RENDERING_CONTROL, "GetVolume")
                    .with_input(ArgumentSpec::input("InstanceID", Datatype::Ui4))
                    .with_input(ArgumentSpec::input("Channel", Datatype::String))
                    .with_output(ArgumentSpec::output("CurrentVolume", Datatype::Ui2)),
            )
            .with_action(
                ActionDescriptor::new(RENDERING_CONTROL, "SetVolume")
                    .with_input(ArgumentSpec::input("InstanceID", Datatype::Ui4))
                    .with_input(
                        ArgumentSpec::input("Channel", Datatype::String).with_alias("Chan"),
                    )
                    .with_input(ArgumentSpec::input("DesiredVolume", Datatype::Ui2)),
            ),
    )
}

/// Vendor service carrying every non-string, non-integer datatype
pub fn sensor() -> Arc<ServiceDescriptor> {
    let mut service = ServiceDescriptor::new(SENSOR);
    let mut set = ActionDescriptor::new(SENSOR, "SetSample");
    let mut get = ActionDescriptor::new(SENSOR, "GetSample");
    for (name, datatype) in TYPED_VARIABLES {
        service = service.with_state_variable(StateVariable::new(name, datatype));
        set = set.with_input(ArgumentSpec::input(name, datatype));
        get = get.with_output(ArgumentSpec::output(name, datatype));
    }
    Arc::new(service.with_action(set).with_action(get))
}

fn naive_date() -> impl Strategy<Value = NaiveDate> {
    (1970i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn naive_time() -> impl Strategy<Value = NaiveTime> {
    (0u32..24, 0u32..60, 0u32..60, prop_oneof![Just(0u32), 0u32..1_000_000_000])
        .prop_map(|(h, m, s, nano)| NaiveTime::from_hms_nano_opt(h, m, s, nano).unwrap())
}

/// One value per entry of [`TYPED_VARIABLES`], in the same order
pub fn typed_values() -> impl Strategy<Value = Vec<Value>> {
    (
        any::<f32>().prop_filter("finite", |f| f.is_finite()),
        any::<f64>().prop_filter("finite", |f| f.is_finite()),
        -1.0e30f64..1.0e30,
        prop::char::range(' ', '\u{d7ff}'),
        prop::collection::vec(any::<u8>(), 1..32),
        prop::collection::vec(any::<u8>(), 1..32),
        naive_date(),
        (naive_date(), naive_time()),
        (naive_date(), naive_time(), -840i32..=840),
        naive_time(),
    )
        .prop_map(
            |(reading, average, drift, unit, snapshot, checksum, date, sample, sync, reset)| {
                let (sync_date, sync_time, offset_minutes) = sync;
                let last_sync = FixedOffset::east_opt(offset_minutes * 60)
                    .unwrap()
                    .from_local_datetime(&sync_date.and_time(sync_time))
                    .single()
                    .unwrap();
                vec![
                    Value::Float(reading as f64),
                    Value::Float(average),
                    Value::Float(drift),
                    Value::Char(unit),
                    Value::Base64(snapshot),
                    Value::Hex(checksum),
                    Value::Date(date),
                    Value::DateTime(sample.0.and_time(sample.1)),
                    Value::DateTimeTz(last_sync),
                    Value::Time(reset),
                ]
            },
        )
}

pub fn action(service: &ServiceDescriptor, name: &str) -> Arc<ActionDescriptor> {
    service
        .action(name)
        .unwrap_or_else(|| panic!("No action {} in {}", name, service.service_type()))
}

/// Event request as received for the first notification of a subscription
pub fn incoming(service: Arc<ServiceDescriptor>) -> IncomingEventRequest {
    IncomingEventRequest::new("uuid:RINCON_000E58A0000001400_sub0000000042", EventSequence::initial(), service)
}

/// Records every call of an invalid body hook
#[derive(Debug, Clone, Default)]
pub struct HookRecorder {
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl HookRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hook(&self) -> impl Fn(&str, &CodecError) + Send + Sync + 'static {
        let calls = self.calls.clone();
        move |body: &str, err: &CodecError| {
            calls
                .lock()
                .unwrap()
                .push((body.to_string(), err.to_string()));
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}
