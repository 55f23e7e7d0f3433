// Decoder tests: schema-directed payload decoding.
//
// * primitives in both byte orders
// * rest-of-buffer and fixed-count sequences
// * nested records (scalar and array)
// * skipped fields: meta, pointer, bit field, unresolved type
// * recursion limit

#[cfg(test)]
mod tests {
    use recstream_core::schema::{FieldDefinition, FieldFlags, RecordSchema, SchemaRegistry};
    use recstream_core::stream::decoding::{DecodeError, DecoderConfig, RecordDecoder, Scalar, Value};
    use recstream_core::stream::framing::{encode_record, frames, RawRecord};
    use serde_json::json;

    fn field(name: &str, ty: &str, offset_bits: u64, elements: i64, flags: FieldFlags) -> FieldDefinition {
        FieldDefinition::new(name, ty, offset_bits, elements, flags)
    }

    fn registry(schemas: Vec<RecordSchema>) -> SchemaRegistry {
        let registry = SchemaRegistry::new();
        for schema in schemas {
            registry.insert(schema);
        }
        registry
    }

    fn point_schema() -> RecordSchema {
        RecordSchema::new(
            "PT",
            8,
            vec![
                field("x", "INT32", 0, 1, FieldFlags::LE),
                field("y", "INT32", 32, 1, FieldFlags::LE),
            ],
        )
        .unwrap()
    }

    fn point_payload(x: i32, y: i32) -> Vec<u8> {
        let mut payload = x.to_le_bytes().to_vec();
        payload.extend_from_slice(&y.to_le_bytes());
        payload
    }

// # ✅ 1. Two little-endian scalars

    #[test]
    fn decodes_point() {
        let registry = registry(vec![point_schema()]);
        let rec = RecordDecoder::new(&registry)
            .decode("PT", &point_payload(1, 2))
            .unwrap();

        assert_eq!(rec.rectype(), "PT");
        assert_eq!(rec.get("x"), Some(&Value::Scalar(Scalar::I32(1))));
        assert_eq!(rec.get("y"), Some(&Value::Scalar(Scalar::I32(2))));
        assert_eq!(rec.to_json().unwrap(), json!({ "@rectype": "PT", "x": 1, "y": 2 }));
    }

    #[test]
    fn json_keeps_rectype_first_and_field_order() {
        let registry = registry(vec![point_schema()]);
        let rec = RecordDecoder::new(&registry)
            .decode("PT", &point_payload(5, 6))
            .unwrap();

        let text = serde_json::to_string(&rec).unwrap();
        assert_eq!(text, r#"{"@rectype":"PT","x":5,"y":6}"#);
    }

// # ✅ 2. Rest-of-buffer byte sequence

    #[test]
    fn rest_of_buffer_uint8() {
        let registry = registry(vec![RecordSchema::new(
            "BLOB",
            0,
            vec![field("arr", "UINT8", 0, 0, FieldFlags::LE)],
        )
        .unwrap()]);

        let payload = [10u8, 20, 30, 40, 50, 60];
        let rec = RecordDecoder::new(&registry).decode("BLOB", &payload).unwrap();

        let expected: Vec<Scalar> = payload.iter().map(|b| Scalar::U8(*b)).collect();
        assert_eq!(rec.get("arr"), Some(&Value::Array(expected)));
        assert_eq!(rec.get("arr").unwrap().to_bytes(), Some(payload.to_vec()));
    }

    #[test]
    fn rest_of_buffer_past_end_is_empty() {
        let registry = registry(vec![RecordSchema::new(
            "R",
            0,
            vec![
                field("head", "UINT32", 0, 1, FieldFlags::LE),
                field("tail", "UINT16", 128, -1, FieldFlags::LE),
            ],
        )
        .unwrap()]);

        let rec = RecordDecoder::new(&registry).decode("R", &[1, 0, 0, 0]).unwrap();
        assert_eq!(rec.get("head"), Some(&Value::Scalar(Scalar::U32(1))));
        assert_eq!(rec.get("tail"), Some(&Value::Array(Vec::new())));
    }

    #[test]
    fn rest_of_buffer_drops_partial_element() {
        let registry = registry(vec![RecordSchema::new(
            "R",
            0,
            vec![field("v", "UINT16", 0, 0, FieldFlags::BE)],
        )
        .unwrap()]);

        let rec = RecordDecoder::new(&registry).decode("R", &[0, 1, 0, 2, 9]).unwrap();
        assert_eq!(
            rec.get("v"),
            Some(&Value::Array(vec![Scalar::U16(1), Scalar::U16(2)]))
        );
    }

// # ✅ 3. Every primitive, both byte orders

    #[test]
    fn every_primitive_round_trips() {
        let fields = vec![
            field("i8", "INT8", 0, 1, FieldFlags::LE),
            field("i16", "INT16", 8, 1, FieldFlags::LE),
            field("i32", "INT32", 24, 1, FieldFlags::BE),
            field("i64", "INT64", 56, 1, FieldFlags::LE),
            field("u8", "UINT8", 120, 1, FieldFlags::LE),
            field("u16", "UINT16", 128, 1, FieldFlags::BE),
            field("u32", "UINT32", 144, 1, FieldFlags::LE),
            field("u64", "UINT64", 176, 1, FieldFlags::BE),
            field("f32", "FLOAT", 240, 1, FieldFlags::LE),
            field("f64", "DOUBLE", 272, 1, FieldFlags::BE),
            field("t", "TIME8", 336, 1, FieldFlags::LE),
            field("s", "STRING", 400, 4, FieldFlags::empty()),
        ];
        let registry = registry(vec![RecordSchema::new("ALL", 54, fields).unwrap()]);

        let mut payload = Vec::new();
        payload.extend_from_slice(&(-5i8).to_le_bytes());
        payload.extend_from_slice(&(-300i16).to_le_bytes());
        payload.extend_from_slice(&(-70_000i32).to_be_bytes());
        payload.extend_from_slice(&(-5_000_000_000i64).to_le_bytes());
        payload.extend_from_slice(&200u8.to_le_bytes());
        payload.extend_from_slice(&60_000u16.to_be_bytes());
        payload.extend_from_slice(&4_000_000_000u32.to_le_bytes());
        payload.extend_from_slice(&u64::MAX.to_be_bytes());
        payload.extend_from_slice(&1.5f32.to_le_bytes());
        payload.extend_from_slice(&(-2.25f64).to_be_bytes());
        payload.extend_from_slice(&1_234_567_890_123u64.to_le_bytes());
        payload.extend_from_slice(b"ab\0\0");
        assert_eq!(payload.len(), 54);

        let rec = RecordDecoder::new(&registry).decode("ALL", &payload).unwrap();
        let scalar = |name: &str| rec.get(name).and_then(Value::as_scalar).cloned();

        assert_eq!(scalar("i8"), Some(Scalar::I8(-5)));
        assert_eq!(scalar("i16"), Some(Scalar::I16(-300)));
        assert_eq!(scalar("i32"), Some(Scalar::I32(-70_000)));
        assert_eq!(scalar("i64"), Some(Scalar::I64(-5_000_000_000)));
        assert_eq!(scalar("u8"), Some(Scalar::U8(200)));
        assert_eq!(scalar("u16"), Some(Scalar::U16(60_000)));
        assert_eq!(scalar("u32"), Some(Scalar::U32(4_000_000_000)));
        assert_eq!(scalar("u64"), Some(Scalar::U64(u64::MAX)));
        assert_eq!(scalar("f32"), Some(Scalar::F32(1.5)));
        assert_eq!(scalar("f64"), Some(Scalar::F64(-2.25)));
        assert_eq!(scalar("t"), Some(Scalar::Time(1_234_567_890_123)));
        assert_eq!(scalar("s"), Some(Scalar::Bytes(b"ab\0\0".to_vec())));
    }

    #[test]
    fn primitives_survive_encode_and_framing() {
        let registry = registry(vec![RecordSchema::new(
            "MIX",
            23,
            vec![
                field("i16", "INT16", 0, 1, FieldFlags::BE),
                field("u32", "UINT32", 16, 1, FieldFlags::LE),
                field("f64", "DOUBLE", 48, 1, FieldFlags::LE),
                field("t", "TIME8", 112, 1, FieldFlags::BE),
                field("i8", "INT8", 176, 1, FieldFlags::empty()),
            ],
        )
        .unwrap()]);

        let mut payload = (-2i16).to_be_bytes().to_vec();
        payload.extend_from_slice(&7u32.to_le_bytes());
        payload.extend_from_slice(&0.125f64.to_le_bytes());
        payload.extend_from_slice(&99u64.to_be_bytes());
        payload.extend_from_slice(&(-1i8).to_le_bytes());

        let mut wire = encode_record("MIX", &payload).unwrap();
        wire.extend(encode_record("MIX", &payload).unwrap());
        let raws: Vec<_> = frames(wire.chunks(5)).collect();
        assert_eq!(raws.len(), 2);

        let decoder = RecordDecoder::new(&registry);
        for raw in &raws {
            let rec = decoder.decode_raw(raw).unwrap();
            assert_eq!(
                rec.to_json().unwrap(),
                json!({ "@rectype": "MIX", "i16": -2, "u32": 7, "f64": 0.125, "t": 99, "i8": -1 })
            );
        }
    }

// # ✅ 4. Nested records

    fn track_registry() -> SchemaRegistry {
        registry(vec![
            point_schema(),
            RecordSchema::new(
                "TRACK",
                0,
                vec![
                    field("id", "UINT16", 0, 1, FieldFlags::LE),
                    field("origin", "PT", 16, 1, FieldFlags::empty()),
                    field("points", "PT", 80, 0, FieldFlags::empty()),
                ],
            )
            .unwrap(),
        ])
    }

    #[test]
    fn nested_scalar_and_array() {
        let registry = track_registry();

        let mut payload = 9u16.to_le_bytes().to_vec();
        payload.extend(point_payload(-1, -2));
        payload.extend(point_payload(10, 20));
        payload.extend(point_payload(30, 40));
        payload.extend_from_slice(&[0xFF; 3]); // trailing partial element

        let rec = RecordDecoder::new(&registry).decode("TRACK", &payload).unwrap();

        let origin = rec.get("origin").and_then(Value::as_record).expect("origin record");
        assert_eq!(origin.rectype(), "PT");
        assert_eq!(origin.get("x"), Some(&Value::Scalar(Scalar::I32(-1))));

        let points = rec.get("points").and_then(Value::as_records).expect("points");
        assert_eq!(points.len(), 2, "trailing partial element is not decoded");
        assert_eq!(points[1].get("y"), Some(&Value::Scalar(Scalar::I32(40))));

        assert_eq!(
            rec.to_json().unwrap(),
            json!({
                "@rectype": "TRACK",
                "id": 9,
                "origin": { "@rectype": "PT", "x": -1, "y": -2 },
                "points": [
                    { "@rectype": "PT", "x": 10, "y": 20 },
                    { "@rectype": "PT", "x": 30, "y": 40 }
                ]
            })
        );
    }

    #[test]
    fn nested_fixed_count_respects_datasize() {
        let registry = registry(vec![
            point_schema(),
            RecordSchema::new("PAIR", 16, vec![field("p", "PT", 0, 2, FieldFlags::empty())]).unwrap(),
        ]);

        let mut payload = point_payload(1, 2);
        payload.extend(point_payload(3, 4));

        let rec = RecordDecoder::new(&registry).decode("PAIR", &payload).unwrap();
        let p = rec.get("p").and_then(Value::as_records).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p[1].get("x"), Some(&Value::Scalar(Scalar::I32(3))));
    }

    #[test]
    fn nested_rest_of_buffer_with_zero_datasize_is_empty() {
        let registry = registry(vec![
            RecordSchema::new("Z", 0, vec![field("b", "UINT8", 0, 1, FieldFlags::empty())]).unwrap(),
            RecordSchema::new("OUTER", 0, vec![field("zs", "Z", 0, 0, FieldFlags::empty())]).unwrap(),
        ]);

        let rec = RecordDecoder::new(&registry).decode("OUTER", &[1, 2, 3]).unwrap();
        assert_eq!(rec.get("zs"), Some(&Value::Records(Vec::new())));
    }

    #[test]
    fn huge_count_of_zero_sized_records_is_bounded() {
        let registry = registry(vec![
            RecordSchema::new("Z", 0, vec![field("b", "UINT8", 0, 1, FieldFlags::empty())]).unwrap(),
            RecordSchema::new("OUTER", 0, vec![field("zs", "Z", 0, i64::MAX, FieldFlags::empty())]).unwrap(),
        ]);

        let rec = RecordDecoder::new(&registry).decode("OUTER", &[1, 2, 3]).unwrap();
        let zs = rec.get("zs").and_then(Value::as_records).expect("zs records");
        assert_eq!(zs.len(), 1);
        assert_eq!(zs[0].get("b"), Some(&Value::Scalar(Scalar::U8(1))));
    }

    #[test]
    fn huge_count_of_sized_records_is_bounded_by_payload() {
        let registry = registry(vec![
            point_schema(),
            RecordSchema::new("MANY", 0, vec![field("p", "PT", 0, i64::MAX, FieldFlags::empty())]).unwrap(),
        ]);

        let rec = RecordDecoder::new(&registry).decode("MANY", &point_payload(1, 2)).unwrap();
        assert_eq!(rec.get("p").and_then(Value::as_records).map(<[_]>::len), Some(1));
    }

// # ✅ 5. Fields that are never decoded

    #[test]
    fn pointer_meta_bitfield_and_unknown_fields_are_absent() {
        let registry = registry(vec![RecordSchema::new(
            "SKIP",
            0,
            vec![
                field("ptr", "UINT64", 0, 1, FieldFlags::LE | FieldFlags::PTR),
                field("@meta", "UINT8", 0, 1, FieldFlags::empty()),
                field("bits", "BITFIELD", 0, 1, FieldFlags::empty()),
                field("other", "NOT_REGISTERED", 0, 1, FieldFlags::empty()),
                field("kept", "UINT8", 64, 1, FieldFlags::empty()),
            ],
        )
        .unwrap()]);

        let payload = [0u8, 0, 0, 0, 0, 0, 0, 0, 42];
        let rec = RecordDecoder::new(&registry).decode("SKIP", &payload).unwrap();

        assert_eq!(rec.len(), 1, "only the plain field survives");
        assert_eq!(rec.get("kept"), Some(&Value::Scalar(Scalar::U8(42))));
        for name in ["ptr", "@meta", "bits", "other"] {
            assert!(rec.get(name).is_none(), "{name} must be absent");
        }
    }

// # ✅ 6. Unknown top-level type gives a stub

    #[test]
    fn unknown_type_is_stub() {
        let registry = SchemaRegistry::new();
        let raw = RawRecord::new(b"mystery\0\x01\x02".to_vec());

        let rec = RecordDecoder::new(&registry).decode_raw(&raw).unwrap();
        assert!(rec.is_stub());
        assert_eq!(rec.to_json().unwrap(), json!({ "@rectype": "mystery" }));
    }

// # ❌ 7. Recursion limit

    #[test]
    fn self_referencing_schema_hits_depth_limit() {
        let registry = registry(vec![RecordSchema::new(
            "LOOP",
            0,
            vec![field("next", "LOOP", 0, 1, FieldFlags::empty())],
        )
        .unwrap()]);

        let decoder = RecordDecoder::with_config(&registry, DecoderConfig { max_depth: 4 });
        let err = decoder.decode("LOOP", &[]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::DepthExceeded { max_depth: 4, .. }
        ));
    }

    #[test]
    fn depth_limit_allows_exact_depth() {
        let registry = registry(vec![
            RecordSchema::new("L0", 0, vec![field("a", "L1", 0, 1, FieldFlags::empty())]).unwrap(),
            RecordSchema::new("L1", 0, vec![field("b", "L2", 0, 1, FieldFlags::empty())]).unwrap(),
            RecordSchema::new("L2", 0, vec![field("v", "UINT8", 0, 1, FieldFlags::empty())]).unwrap(),
        ]);

        let rec = RecordDecoder::with_config(&registry, DecoderConfig { max_depth: 2 })
            .decode("L0", &[7])
            .unwrap();
        let a = rec.get("a").and_then(Value::as_record).expect("L1 record");
        let b = a.get("b").and_then(Value::as_record).expect("L2 record");
        assert_eq!(b.rectype(), "L2");
        assert_eq!(b.get("v"), Some(&Value::Scalar(Scalar::U8(7))));
        assert_eq!(
            rec.to_json().unwrap(),
            json!({ "@rectype": "L0", "a": { "@rectype": "L1", "b": { "@rectype": "L2", "v": 7 } } })
        );

        let too_deep = RecordDecoder::with_config(&registry, DecoderConfig { max_depth: 1 }).decode("L0", &[7]);
        assert!(matches!(too_deep, Err(DecodeError::DepthExceeded { .. })));
    }

// # ✅ 8. On-demand schema fetch

    #[test]
    fn fetcher_resolves_missing_types() {
        use recstream_core::schema::StaticSchemaSource;

        let source = StaticSchemaSource::from_json_str(
            r#"{ "PT": {
                    "@datasize": 8,
                    "x": { "type": "INT32", "offset": 0,  "elements": 1, "flags": "LE" },
                    "y": { "type": "INT32", "offset": 32, "elements": 1, "flags": "LE" } } }"#,
        )
        .unwrap();
        let registry = SchemaRegistry::new();

        let rec = RecordDecoder::new(&registry)
            .with_fetcher(&source)
            .decode("PT", &point_payload(3, 4))
            .unwrap();

        assert_eq!(rec.get("y"), Some(&Value::Scalar(Scalar::I32(4))));
        assert!(registry.contains("PT"), "fetched schema is cached");
    }

    #[test]
    fn fetcher_without_definition_gives_stub_and_omits_field() {
        use recstream_core::schema::StaticSchemaSource;

        let source = StaticSchemaSource::from_json_str(
            r#"{ "WRAP": {
                    "id":    { "type": "UINT8",   "offset": 0, "elements": 1 },
                    "extra": { "type": "MISSING", "offset": 8, "elements": 1 } } }"#,
        )
        .unwrap();
        let registry = SchemaRegistry::new();
        let decoder = RecordDecoder::new(&registry).with_fetcher(&source);

        let stub = decoder.decode("progress", b"...").unwrap();
        assert!(stub.is_stub());
        assert_eq!(stub.rectype(), "progress");

        let rec = decoder.decode("WRAP", &[5, 6]).unwrap();
        assert_eq!(rec.to_json().unwrap(), json!({ "@rectype": "WRAP", "id": 5 }));
        assert!(!registry.contains("progress"), "missing definitions are not cached");
    }

    #[test]
    fn failing_fetcher_is_an_error() {
        use recstream_core::schema::SchemaError;

        let down = |name: &str| -> Result<RecordSchema, SchemaError> {
            Err(SchemaError::fetch(name, "connection refused"))
        };
        let registry = SchemaRegistry::new();

        let err = RecordDecoder::new(&registry)
            .with_fetcher(&down)
            .decode("PT", &point_payload(1, 2))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Schema(SchemaError::Fetch { .. })), "got {err:?}");
    }
}
