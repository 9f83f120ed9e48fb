//! SOAP codec tests against device captures and generated invocations

mod helpers;

use helpers::{
    action, av_transport, load_fixture, rendering_control, sensor, typed_values, HookRecorder,
    TYPED_VARIABLES,
};
use proptest::prelude::*;
use rstest::rstest;
use upnp_codec::{ActionCodec, CodecConfig, CodecError, SoapActionCodec, UpnpCodecs};
use upnp_model::{
    ActionError, ActionInvocation, ArgumentValue, ErrorCode, FaultCode, Value,
};

fn wire_texts(values: &[ArgumentValue]) -> Vec<(String, String)> {
    values
        .iter()
        .map(|v| (v.name().to_string(), v.to_wire_string()))
        .collect()
}

#[test]
fn test_encoded_request_is_well_formed() {
    let mut invocation = ActionInvocation::new(action(&av_transport(), "SetAVTransportURI"));
    invocation.set_input("InstanceID", 0u32).unwrap();
    invocation
        .set_input("CurrentURI", "http://10.0.0.7/a.flac?x=1&y=<2>")
        .unwrap();
    invocation
        .set_input("CurrentURIMetaData", r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"/>"#)
        .unwrap();

    let body = SoapActionCodec.encode_request(&invocation).unwrap();
    let envelope = xmltree::Element::parse(body.as_bytes()).expect("envelope is not well-formed");

    assert_eq!(envelope.name, "Envelope");
    let request = envelope
        .get_child("Body")
        .and_then(|b| b.get_child("SetAVTransportURI"))
        .expect("missing action element");
    assert_eq!(
        request.namespace.as_deref(),
        Some("urn:schemas-upnp-org:service:AVTransport:1")
    );
    assert_eq!(
        request.get_child("CurrentURI").unwrap().get_text().unwrap(),
        "http://10.0.0.7/a.flac?x=1&y=<2>"
    );
    assert_eq!(
        request.get_child("CurrentURIMetaData").unwrap().get_text().unwrap(),
        r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"/>"#
    );
}

#[test]
fn test_unset_inputs_are_written_empty() {
    let mut invocation = ActionInvocation::new(action(&av_transport(), "SetAVTransportURI"));
    invocation.set_input("CurrentURI", "x-rincon-queue:1").unwrap();

    let body = SoapActionCodec.encode_request(&invocation).unwrap();
    assert!(body.contains("<InstanceID></InstanceID>\n<CurrentURI>x-rincon-queue:1</CurrentURI>"));
    assert!(body.contains("<CurrentURIMetaData></CurrentURIMetaData>"));
}

#[test]
fn test_decode_request_tolerates_aliases_and_unknown_elements() {
    let body = load_fixture("soap/set_av_transport_uri_aliases.xml");
    let action = action(&av_transport(), "SetAVTransportURI");

    let values = SoapActionCodec.decode_request(&body, &action).unwrap();
    assert_eq!(
        wire_texts(&values),
        vec![
            ("InstanceID".to_string(), "0".to_string()),
            ("CurrentURI".to_string(), "http://10.0.0.7/stream.mp3".to_string()),
            ("CurrentURIMetaData".to_string(), String::new()),
        ]
    );
}

#[test]
fn test_declared_alias_is_accepted() {
    let body = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
<u:SetVolume xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1">
<InstanceID>0</InstanceID><Chan>Master</Chan><DesiredVolume>30</DesiredVolume>
</u:SetVolume></s:Body></s:Envelope>"#;
    let action = action(&rendering_control(), "SetVolume");

    let values = SoapActionCodec.decode_request(body, &action).unwrap();
    assert_eq!(values[1].name(), "Channel");
    assert_eq!(values[1].value().and_then(Value::as_str), Some("Master"));
    assert_eq!(values[2].value().and_then(Value::as_u64), Some(30));
}

#[rstest]
#[case::missing_argument("<InstanceID>0</InstanceID><Unit>REL_TIME</Unit>")]
#[case::only_unknown("<Foo>1</Foo><Bar>2</Bar><Baz>3</Baz>")]
#[case::duplicate_does_not_count_twice("<InstanceID>0</InstanceID><InstanceID>1</InstanceID><Unit>REL_TIME</Unit>")]
fn test_decode_request_count_mismatch(#[case] arguments: &str) {
    let body = format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:Seek xmlns:u="urn:schemas-upnp-org:service:AVTransport:1">{}</u:Seek></s:Body></s:Envelope>"#,
        arguments
    );
    let err = SoapActionCodec
        .decode_request(&body, &action(&av_transport(), "Seek"))
        .unwrap_err();

    assert!(err.is_unsupported_data());
    assert!(err.to_string().contains("Invalid number of input or output arguments"));
}

#[test]
fn test_duplicate_argument_first_wins() {
    let body = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:Seek xmlns:u="urn:schemas-upnp-org:service:AVTransport:1"><InstanceID>0</InstanceID><Unit>REL_TIME</Unit><Unit>TRACK_NR</Unit><Target>0:01:00</Target></u:Seek></s:Body></s:Envelope>"#;
    let values = SoapActionCodec
        .decode_request(body, &action(&av_transport(), "Seek"))
        .unwrap();
    assert_eq!(values[1].to_wire_string(), "REL_TIME");
}

#[test]
fn test_invalid_input_value_is_argument_conversion() {
    let body = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:Seek xmlns:u="urn:schemas-upnp-org:service:AVTransport:1"><InstanceID>zero</InstanceID><Unit>REL_TIME</Unit><Target>0:01:00</Target></u:Seek></s:Body></s:Envelope>"#;
    let err = UpnpCodecs::default()
        .soap()
        .decode_request(body, &action(&av_transport(), "Seek"))
        .unwrap_err();

    match err {
        CodecError::ArgumentConversion(failure) => {
            assert_eq!(failure.code().code(), 600);
            assert!(failure.description().contains("InstanceID"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_response_output_conversion_failure() {
    let body = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:GetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1"><CurrentVolume>loud</CurrentVolume></u:GetVolumeResponse></s:Body></s:Envelope>"#;
    let mut invocation = ActionInvocation::new(action(&rendering_control(), "GetVolume"));

    let err = SoapActionCodec
        .decode_response(body, &mut invocation)
        .unwrap_err();
    assert!(matches!(err, CodecError::ArgumentConversion(_)));
    assert_eq!(
        invocation.failure().map(|f| f.code()),
        Some(FaultCode::Standard(ErrorCode::ActionFailed))
    );
    assert!(invocation.output().is_empty());
}

#[test]
fn test_upnp_error_spelling_variant() {
    let body = load_fixture("soap/upnp_error_fault.xml");
    let mut invocation = ActionInvocation::new(action(&av_transport(), "Seek"));

    SoapActionCodec.decode_response(&body, &mut invocation).unwrap();

    let failure = invocation.failure().expect("fault not decoded");
    assert_eq!(failure.code(), FaultCode::Custom(701));
    assert_eq!(failure.description(), "");
    assert!(!invocation.is_success());
}

#[rstest]
#[case::standard_description_when_missing(401, None, "No action by that name at this service")]
#[case::device_description(714, Some("Illegal MIME-type"), "Illegal MIME-type")]
#[case::empty_description(501, Some(""), "")]
fn test_fault_descriptions(
    #[case] code: u32,
    #[case] description: Option<&str>,
    #[case] expected: &str,
) {
    let description = description
        .map(|d| format!("<errorDescription>{}</errorDescription>", d))
        .unwrap_or_default();
    let body = format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>{}</errorCode>{}</UPnPError></detail></s:Fault></s:Body></s:Envelope>"#,
        code, description
    );
    let mut invocation = ActionInvocation::new(action(&rendering_control(), "GetVolume"));
    SoapActionCodec.decode_response(&body, &mut invocation).unwrap();

    let failure = invocation.failure().unwrap();
    assert_eq!(failure.code().code(), code);
    assert_eq!(failure.description(), expected);
}

#[test]
fn test_fault_with_non_numeric_code() {
    let body = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><detail><UPnPError><errorCode>seven</errorCode></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;
    let mut invocation = ActionInvocation::new(action(&rendering_control(), "GetVolume"));

    let err = SoapActionCodec
        .decode_response(body, &mut invocation)
        .unwrap_err();
    assert!(err.to_string().contains("Error code was not a number"));
}

#[test]
fn test_response_element_name_is_case_sensitive() {
    let body = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:getvolumeresponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1"><CurrentVolume>3</CurrentVolume></u:getvolumeresponse></s:Body></s:Envelope>"#;
    let mut invocation = ActionInvocation::new(action(&rendering_control(), "GetVolume"));

    assert!(SoapActionCodec
        .decode_response(body, &mut invocation)
        .unwrap_err()
        .is_unsupported_data());
}

#[test]
fn test_truncated_envelope_is_repaired() {
    let body = load_fixture("soap/yamaha_get_position_info.xml");
    assert!(body.trim_end().ends_with("</s:Envelop"));

    let recorder = HookRecorder::new();
    let codecs = UpnpCodecs::default().with_invalid_body_hook(recorder.hook());
    let mut invocation = ActionInvocation::new(action(&av_transport(), "GetPositionInfo"));

    codecs.soap().decode_response(&body, &mut invocation).unwrap();

    assert!(invocation.is_success());
    assert_eq!(invocation.output_value("Track").and_then(Value::as_u64), Some(1));
    assert_eq!(
        invocation.output_value("RelCount").and_then(Value::as_i64),
        Some(2147483647)
    );
    assert!(invocation
        .output_value("TrackMetaData")
        .and_then(Value::as_str)
        .unwrap()
        .starts_with("<DIDL-Lite"));
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_repair_retry_discards_previous_outcome() {
    let body = load_fixture("soap/yamaha_get_position_info.xml");
    let mut invocation = ActionInvocation::new(action(&av_transport(), "GetPositionInfo"));
    invocation.set_failure(ActionError::standard(ErrorCode::ActionFailed));

    UpnpCodecs::default()
        .soap()
        .decode_response(&body, &mut invocation)
        .unwrap();

    assert!(invocation.failure().is_none());
    assert_eq!(invocation.output().len(), 8);
    assert_eq!(invocation.output_value("Track").and_then(Value::as_u64), Some(1));
}

#[test]
fn test_truncated_envelope_without_recovery() {
    let body = load_fixture("soap/yamaha_get_position_info.xml");
    let codecs = UpnpCodecs::new(CodecConfig::strict()).unwrap();
    let mut invocation = ActionInvocation::new(action(&av_transport(), "GetPositionInfo"));

    let err = codecs.soap().decode_response(&body, &mut invocation).unwrap_err();
    assert!(err.is_unsupported_data());
    assert!(invocation.output().is_empty());
}

#[test]
fn test_raw_ampersand_in_request_is_repaired() {
    let body = load_fixture("soap/twonky_set_av_transport_uri.xml");
    let action = action(&av_transport(), "SetAVTransportURI");

    assert!(SoapActionCodec
        .decode_request(&body, &action)
        .unwrap_err()
        .is_unsupported_data());

    let values = UpnpCodecs::default()
        .soap()
        .decode_request(&body, &action)
        .unwrap();
    assert_eq!(
        values[1].to_wire_string(),
        "http://192.168.1.14:56923/content/12a470d854dbc6887e4103e3140783fd.wav?profile_id=0&convert=wav"
    );
}

#[test]
fn test_unrepairable_body_returns_original_error() {
    let body = "<s:Envelope><s:Body><u:GetVolumeResponse><CurrentVolume>3</Current";
    let recorder = HookRecorder::new();
    let codecs = UpnpCodecs::default().with_invalid_body_hook(recorder.hook());
    let mut invocation = ActionInvocation::new(action(&rendering_control(), "GetVolume"));

    let direct = SoapActionCodec
        .decode_response(body, &mut ActionInvocation::new(action(&rendering_control(), "GetVolume")))
        .unwrap_err();
    let err = codecs.soap().decode_response(body, &mut invocation).unwrap_err();

    assert_eq!(err.to_string(), direct.to_string());
    assert_eq!(err.body(), Some(body));
    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, direct.to_string());
}

#[test]
fn test_failure_response_round_trip() {
    let codec = SoapActionCodec;
    let mut invocation = ActionInvocation::new(action(&av_transport(), "Seek"));
    invocation.set_failure(ActionError::standard(ErrorCode::InvalidArgs));

    let body = codec.encode_response(&invocation).unwrap();
    xmltree::Element::parse(body.as_bytes()).expect("fault envelope is not well-formed");

    let mut decoded = ActionInvocation::new(action(&av_transport(), "Seek"));
    codec.decode_response(&body, &mut decoded).unwrap();
    assert_eq!(decoded.failure(), Some(&ActionError::standard(ErrorCode::InvalidArgs)));
}

fn text_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 &<>\"'=?/:;.,_%#\u{e9}\u{4e2d}-]{0,48}"
}

proptest! {
    #[test]
    fn prop_request_round_trip(instance in any::<u32>(), uri in text_value(), metadata in text_value()) {
        let action = action(&av_transport(), "SetAVTransportURI");
        let mut invocation = ActionInvocation::new(action.clone());
        invocation.set_input("InstanceID", instance).unwrap();
        invocation.set_input("CurrentURI", uri.as_str()).unwrap();
        invocation.set_input("CurrentURIMetaData", metadata.as_str()).unwrap();

        let body = SoapActionCodec.encode_request(&invocation).unwrap();
        let decoded = SoapActionCodec.decode_request(&body, &action).unwrap();

        prop_assert_eq!(wire_texts(&decoded), wire_texts(invocation.input()));
    }

    #[test]
    fn prop_response_round_trip(
        track in any::<u32>(),
        rel_count in any::<i32>(),
        abs_count in any::<i32>(),
        uri in text_value(),
    ) {
        let action = action(&av_transport(), "GetPositionInfo");
        let texts = [
            track.to_string(),
            "0:03:10".to_string(),
            String::new(),
            uri,
            "0:00:12".to_string(),
            "NOT_IMPLEMENTED".to_string(),
            rel_count.to_string(),
            abs_count.to_string(),
        ];
        let values: Vec<ArgumentValue> = action
            .outputs()
            .iter()
            .zip(&texts)
            .map(|(spec, text)| ArgumentValue::from_wire(spec, text).unwrap())
            .collect();
        let mut invocation = ActionInvocation::new(action.clone());
        invocation.set_output(values).unwrap();

        let body = SoapActionCodec.encode_response(&invocation).unwrap();
        let mut decoded = ActionInvocation::new(action);
        SoapActionCodec.decode_response(&body, &mut decoded).unwrap();

        prop_assert!(decoded.failure().is_none());
        prop_assert_eq!(wire_texts(decoded.output()), wire_texts(invocation.output()));
    }

    #[test]
    fn prop_typed_request_round_trip(values in typed_values()) {
        let action = action(&sensor(), "SetSample");
        let mut invocation = ActionInvocation::new(action.clone());
        for ((name, _), value) in TYPED_VARIABLES.iter().zip(values) {
            invocation.set_input(name, value).unwrap();
        }

        let body = SoapActionCodec.encode_request(&invocation).unwrap();
        let decoded = SoapActionCodec.decode_request(&body, &action).unwrap();

        prop_assert_eq!(decoded.as_slice(), invocation.input());
    }

    #[test]
    fn prop_typed_response_round_trip(values in typed_values()) {
        let action = action(&sensor(), "GetSample");
        let outputs: Vec<ArgumentValue> = action
            .outputs()
            .iter()
            .zip(values)
            .map(|(spec, value)| ArgumentValue::new(spec, Some(value)).unwrap())
            .collect();
        let mut invocation = ActionInvocation::new(action.clone());
        invocation.set_output(outputs).unwrap();

        let body = SoapActionCodec.encode_response(&invocation).unwrap();
        let mut decoded = ActionInvocation::new(action);
        SoapActionCodec.decode_response(&body, &mut decoded).unwrap();

        prop_assert!(decoded.failure().is_none());
        prop_assert_eq!(decoded.output(), invocation.output());
    }

    #[test]
    fn prop_fault_round_trip(code in 401u32..900, description in text_value()) {
        let action = action(&rendering_control(), "GetVolume");
        let mut invocation = ActionInvocation::new(action.clone());
        invocation.set_failure(ActionError::new(FaultCode::from_code(code), description.clone()));

        let body = SoapActionCodec.encode_response(&invocation).unwrap();
        let mut decoded = ActionInvocation::new(action);
        SoapActionCodec.decode_response(&body, &mut decoded).unwrap();

        let failure = decoded.failure().unwrap();
        prop_assert_eq!(failure.code().code(), code);
        prop_assert_eq!(failure.description(), description.as_str());
        prop_assert!(decoded.output().is_empty());
    }
}
