#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use dsg::catalog::models::GlossaryTerm;
    use dsg::catalog::{
        CatalogClient, CatalogError, CatalogRequest, CatalogResponse, Method, Transport,
    };
    use serde_json::{json, Value};

    const BASE: &str = "http://catalog.test";

    /// Records every request and replays canned responses, 200 once they run out.
    #[derive(Default)]
    struct FakeTransport {
        requests: RefCell<Vec<CatalogRequest>>,
        responses: RefCell<VecDeque<Result<CatalogResponse, CatalogError>>>,
    }

    impl FakeTransport {
        fn with_responses(responses: Vec<Result<CatalogResponse, CatalogError>>) -> Self {
            Self {
                requests: RefCell::default(),
                responses: RefCell::new(responses.into()),
            }
        }

        fn requests(&self) -> Vec<CatalogRequest> {
            self.requests.borrow().clone()
        }
    }

    impl Transport for FakeTransport {
        fn execute(&self, request: CatalogRequest) -> Result<CatalogResponse, CatalogError> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(ok("")))
        }
    }

    fn ok(body: &str) -> CatalogResponse {
        CatalogResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    fn status(code: u16) -> Result<CatalogResponse, CatalogError> {
        Ok(CatalogResponse {
            status: code,
            body: "boom".to_string(),
        })
    }

    fn page(count: usize, start: usize, cursor: Option<&str>) -> Result<CatalogResponse, CatalogError> {
        let entities: Vec<Value> = (start..start + count)
            .map(|i| {
                json!({
                    "urn": format!("urn:li:dataset:(urn:li:dataPlatform:hive,table_{},PROD)", i),
                    "schemaMetadata": {"value": {"schemaName": format!("table_{}", i), "fields": []}}
                })
            })
            .collect();

        let mut body = json!({"entities": entities, "metadata": {"total": 42}});
        if let Some(cursor) = cursor {
            body["scrollId"] = json!(cursor);
        }
        Ok(ok(&body.to_string()))
    }

    fn client(transport: FakeTransport) -> CatalogClient<FakeTransport> {
        CatalogClient::with_transport(BASE, Some("secret".to_string()), transport)
    }

    #[test]
    fn test_post_entities_sends_one_request_per_element() {
        let client = client(FakeTransport::default());
        let payload = r#"[{"urn":"a"}, {"urn":"b","x":[1,2]}, {"urn":"c"}]"#;

        let count = client.post_entities("dataset", payload).unwrap();
        assert_eq!(count, 3);

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 3);
        for request in &requests {
            assert_eq!(request.method, Method::Post);
            assert_eq!(
                request.url,
                "http://catalog.test/openapi/v3/entity/dataset?async=false&systemMetadata=false"
            );
            assert_eq!(request.header("accept"), Some("application/json"));
            assert_eq!(request.header("content-type"), Some("application/json"));
            assert_eq!(request.header("authorization"), Some("Bearer secret"));
        }

        assert_eq!(requests[0].body.as_deref(), Some(r#"[{"urn":"a"}]"#));
        assert_eq!(requests[1].body.as_deref(), Some(r#"[{"urn":"b","x":[1,2]}]"#));
        assert_eq!(requests[2].body.as_deref(), Some(r#"[{"urn":"c"}]"#));
    }

    #[test]
    fn test_post_uses_resource_type_in_path() {
        let client = client(FakeTransport::default());
        client.post_entities("glossaryTerm", "  [{\"urn\":\"t\"}]\n").unwrap();

        let requests = client.transport().requests();
        assert!(requests[0].url.contains("/openapi/v3/entity/glossaryTerm?"));
    }

    #[test]
    fn test_token_is_optional() {
        let client = CatalogClient::with_transport(BASE, None, FakeTransport::default());
        client.post_entities("dataset", "[{}]").unwrap();

        let client_empty = CatalogClient::with_transport(BASE, Some(String::new()), FakeTransport::default());
        client_empty.post_entities("dataset", "[{}]").unwrap();

        assert_eq!(client.transport().requests()[0].header("authorization"), None);
        assert_eq!(client_empty.transport().requests()[0].header("authorization"), None);
    }

    #[test]
    fn test_bare_object_is_rejected_without_requests() {
        let client = client(FakeTransport::default());

        let result = client.post_entities("dataset", r#"{"a":1}"#);
        assert!(matches!(result, Err(CatalogError::MalformedPayload(_))));
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn test_broken_array_is_a_decode_error() {
        let client = client(FakeTransport::default());

        let result = client.post_entities("dataset", r#"[{"a":1}"#);
        assert!(matches!(result, Err(CatalogError::Decode { .. })));
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn test_empty_array_posts_nothing() {
        let client = client(FakeTransport::default());
        assert_eq!(client.post_entities("dataset", "[]").unwrap(), 0);
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn test_batch_stops_at_first_failure() {
        let transport = FakeTransport::with_responses(vec![Ok(ok("")), status(500)]);
        let client = client(transport);

        let result = client.post_entities("dataset", r#"[{"urn":"a"},{"urn":"b"},{"urn":"c"}]"#);
        let err = result.unwrap_err();
        match &err {
            CatalogError::Batch { index, posted, source } => {
                assert_eq!(*index, 1);
                assert_eq!(*posted, 1);
                assert!(matches!(**source, CatalogError::Remote { status: 500, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("error posting entity 2"));

        // the third element is never sent
        assert_eq!(client.transport().requests().len(), 2);
    }

    #[test]
    fn test_transport_failure_is_reported() {
        let transport = FakeTransport::with_responses(vec![Err(CatalogError::Transport(
            "connection refused".to_string(),
        ))]);
        let client = client(transport);

        let err = client.post_entities("dataset", "[{}]").unwrap_err();
        match err {
            CatalogError::Batch { index: 0, posted: 0, source } => {
                assert!(matches!(*source, CatalogError::Transport(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_success_range_is_2xx() {
        let transport = FakeTransport::with_responses(vec![status(201), status(299), status(300)]);
        let client = client(transport);

        let err = client.post_entities("dataset", "[{},{},{}]").unwrap_err();
        assert!(matches!(err, CatalogError::Batch { index: 2, posted: 2, .. }));
        assert_eq!(err.status(), Some(300));
    }

    #[test]
    fn test_post_glossary_terms_wraps_single_term() {
        let client = client(FakeTransport::default());
        let term = GlossaryTerm::internal("Revenue", None, "Money coming in");

        assert_eq!(client.post_glossary_terms(&[term]).unwrap(), 1);

        let requests = client.transport().requests();
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!([{
                "urn": "urn:li:glossaryTerm:Revenue",
                "glossaryTermInfo": {"value": {
                    "name": "Revenue",
                    "definition": "Money coming in",
                    "termSource": "INTERNAL"
                }}
            }])
        );
    }

    #[test]
    fn test_list_datasets_follows_cursor_until_it_disappears() {
        let transport = FakeTransport::with_responses(vec![
            page(2, 0, Some("c1")),
            page(2, 2, Some("c2")),
            page(1, 4, None),
            page(5, 5, Some("never")),
        ]);
        let client = client(transport);

        let mut urns = Vec::new();
        client
            .list_datasets(2, |datasets| -> Result<(), CatalogError> {
                urns.extend(datasets.into_iter().map(|d| d.urn));
                Ok(())
            })
            .unwrap();

        assert_eq!(urns.len(), 5);
        assert!(urns[4].contains("table_4"));
        assert_eq!(client.transport().requests().len(), 3);
    }

    #[test]
    fn test_list_datasets_page_sizes_and_stop_conditions() {
        let page_size = 4;
        let transport = FakeTransport::with_responses(vec![
            page(page_size, 0, Some("c1")),
            page(page_size, 4, Some("c2")),
            page(3, 8, Some("")),
            page(0, 0, None),
        ]);
        let client = client(transport);

        let mut sizes = Vec::new();
        client
            .list_datasets(page_size, |datasets| -> Result<(), CatalogError> {
                sizes.push(datasets.len());
                Ok(())
            })
            .unwrap();

        assert_eq!(sizes, vec![page_size, page_size, 3]);
        assert_eq!(client.transport().requests().len(), 3);
    }

    #[test]
    fn test_list_datasets_keeps_columns_of_other_types() {
        let body = json!({
            "entities": [{
                "urn": "urn:li:dataset:(urn:li:dataPlatform:hive,users,PROD)",
                "schemaMetadata": {"value": {
                    "schemaName": "users",
                    "fields": [
                        {"fieldPath": "active", "type": {"type": {"com.linkedin.schema.BooleanType": {}}}},
                        {"fieldPath": "born", "type": {"type": {"com.linkedin.schema.DateType": {}}}}
                    ]
                }}
            }],
            "scrollId": "c1"
        });
        let transport = FakeTransport::with_responses(vec![Ok(ok(&body.to_string())), page(0, 0, None)]);
        let client = client(transport);

        let mut pages = Vec::new();
        client
            .list_datasets(10, |datasets| -> Result<(), CatalogError> {
                pages.push(datasets);
                Ok(())
            })
            .unwrap();

        assert_eq!(pages.len(), 1);
        let fields = &pages[0][0].schema_metadata.as_ref().unwrap().value.fields;
        let tags: Vec<&str> = fields
            .iter()
            .map(|f| f.field_type.as_ref().unwrap().kind.tag())
            .collect();
        assert_eq!(
            tags,
            vec!["com.linkedin.schema.BooleanType", "com.linkedin.schema.DateType"]
        );
        assert_eq!(client.transport().requests().len(), 2);
    }

    #[test]
    fn test_scroll_request_parameters() {
        let transport = FakeTransport::with_responses(vec![page(1, 0, Some("abc+/=")), page(0, 0, None)]);
        let client = client(transport);

        let pages: Vec<_> = client.dataset_pages(10).collect();
        assert_eq!(pages.len(), 1);

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 2);

        let first = &requests[0];
        assert_eq!(first.method, Method::Get);
        assert_eq!(first.body, None);
        assert_eq!(first.header("authorization"), Some("Bearer secret"));
        assert_eq!(
            first.url,
            "http://catalog.test/openapi/v3/entity/dataset?systemMetadata=false\
             &aspects=schemaMetadata&aspects=glossaryTerms&aspects=editableSchemaMetadata\
             &count=10&sort=urn&sortOrder=ASCENDING&query=*"
        );

        let second = &requests[1];
        assert!(second.url.contains("&count=10&scrollId=abc%2B%2F%3D"));
        assert!(!second.url.contains("sort="));
        assert!(!second.url.contains("query="));
    }

    #[test]
    fn test_empty_page_ends_scroll_even_with_cursor() {
        let transport = FakeTransport::with_responses(vec![page(0, 0, Some("c1")), page(3, 0, None)]);
        let client = client(transport);

        let mut calls = 0;
        client
            .list_datasets(3, |_| -> Result<(), CatalogError> {
                calls += 1;
                Ok(())
            })
            .unwrap();

        assert_eq!(calls, 0);
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[test]
    fn test_callback_error_stops_iteration() {
        let transport = FakeTransport::with_responses(vec![page(2, 0, Some("c1")), page(2, 2, None)]);
        let client = client(transport);

        let result = client.list_datasets(2, |_| -> Result<(), CatalogError> {
            Err(CatalogError::MalformedPayload("stop here".to_string()))
        });

        assert!(matches!(result, Err(CatalogError::MalformedPayload(msg)) if msg == "stop here"));
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[test]
    fn test_list_errors_surface() {
        let client_remote = client(FakeTransport::with_responses(vec![status(401)]));
        let remote = client_remote.list_datasets(5, |_| -> Result<(), CatalogError> { Ok(()) });
        assert!(matches!(remote, Err(CatalogError::Remote { status: 401, .. })));

        let client_decode = client(FakeTransport::with_responses(vec![Ok(ok("<html>"))]));
        let decode = client_decode.list_datasets(5, |_| -> Result<(), CatalogError> { Ok(()) });
        assert!(matches!(decode, Err(CatalogError::Decode { .. })));

        let client_shape = client(FakeTransport::with_responses(vec![Ok(ok(r#"{"entities": {"urn": "x"}}"#))]));
        let shape = client_shape.list_datasets(5, |_| -> Result<(), CatalogError> { Ok(()) });
        assert!(matches!(shape, Err(CatalogError::Decode { .. })));
    }

    #[test]
    fn test_unparsable_base_url_is_a_config_error() {
        let client = CatalogClient::with_transport("not a url", None, FakeTransport::default());

        let result = client.list_datasets(5, |_| -> Result<(), CatalogError> { Ok(()) });
        assert!(matches!(result, Err(CatalogError::Config(msg)) if msg.contains("invalid catalog URL")));
        assert!(client.transport().requests().is_empty());
    }

    #[test]
    fn test_pages_are_fused_after_error() {
        let transport = FakeTransport::with_responses(vec![status(503), page(1, 0, None)]);
        let client = client(transport);

        let mut pages = client.dataset_pages(1);
        assert!(matches!(pages.next(), Some(Err(CatalogError::Remote { status: 503, .. }))));
        assert!(pages.next().is_none());
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[test]
    fn test_each_iteration_restarts_from_first_page() {
        let transport = FakeTransport::with_responses(vec![
            page(1, 0, Some("c1")),
            page(1, 0, None),
        ]);
        let client = client(transport);

        let first = client.dataset_pages(1).next().unwrap().unwrap();
        let second = client.dataset_pages(1).next().unwrap().unwrap();
        assert_eq!(first, second);

        let requests = client.transport().requests();
        assert!(requests.iter().all(|r| !r.url.contains("scrollId")));
    }

    #[test]
    fn test_base_url_normalisation() {
        let default = CatalogClient::with_transport("", None, FakeTransport::default());
        assert_eq!(default.base_url(), "http://localhost:8080");

        let trimmed = CatalogClient::with_transport("https://gms.example.com/", None, FakeTransport::default());
        trimmed.post_entities("dataset", "[{}]").unwrap();
        assert!(trimmed.transport().requests()[0]
            .url
            .starts_with("https://gms.example.com/openapi/v3/entity/dataset?"));
    }
}
