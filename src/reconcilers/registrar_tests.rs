// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `registrar.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::domain::SecurityPolicy;
    use crate::reconcilers::test_support::{spec, spec_from_yaml, FakeGateway, REGIONAL_ZONE_ID};

    fn with_certificate(mut spec: DomainSpec) -> DomainSpec {
        spec.set_certificate_arn("arn:cert".to_string());
        spec
    }

    #[test]
    fn test_rest_request_uses_edge_slot() {
        let request = rest_request(&spec("api.example.com"), "arn:cert");

        assert_eq!(request.certificate_arn.as_deref(), Some("arn:cert"));
        assert!(request.regional_certificate_arn.is_none());
        assert_eq!(request.endpoint_configuration.types, vec![EndpointType::Edge]);
        assert_eq!(request.security_policy, SecurityPolicy::Tls12);
    }

    #[test]
    fn test_rest_request_uses_regional_slot() {
        let spec = spec_from_yaml(
            r"
domainName: api.example.com
endpointType: regional
securityPolicy: tls_1_0
",
        );
        let request = rest_request(&spec, "arn:cert");

        assert!(request.certificate_arn.is_none());
        assert_eq!(request.regional_certificate_arn.as_deref(), Some("arn:cert"));
        assert_eq!(request.security_policy, SecurityPolicy::Tls10);
    }

    #[test]
    fn test_rest_request_wire_format() {
        let request = rest_request(&spec("api.example.com"), "arn:cert");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["domainName"], "api.example.com");
        assert_eq!(json["certificateArn"], "arn:cert");
        assert_eq!(json["endpointConfiguration"]["types"][0], "EDGE");
        assert_eq!(json["securityPolicy"], "TLS_1_2");
        assert!(json.get("regionalCertificateArn").is_none());
    }

    #[test]
    fn test_alias_from_rest_edge_fallback_zone() {
        let description = RestDomainDescription {
            domain_name: "api.example.com".to_string(),
            distribution_domain_name: Some("d111.cloudfront.net".to_string()),
            ..Default::default()
        };

        let alias = alias_from_rest("api.example.com", EndpointType::Edge, &description).unwrap();
        assert_eq!(alias.target, "d111.cloudfront.net");
        assert_eq!(alias.hosted_zone_id, "Z2FDTNDATAQYW2");
    }

    #[test]
    fn test_alias_from_rest_regional_fields() {
        let description = RestDomainDescription {
            domain_name: "api.example.com".to_string(),
            regional_domain_name: Some("d-1.execute-api.us-west-2.amazonaws.com".to_string()),
            regional_hosted_zone_id: Some("ZREGIONAL".to_string()),
            ..Default::default()
        };

        let alias =
            alias_from_rest("api.example.com", EndpointType::Regional, &description).unwrap();
        assert_eq!(alias.target, "d-1.execute-api.us-west-2.amazonaws.com");
        assert_eq!(alias.hosted_zone_id, "ZREGIONAL");
    }

    #[test]
    fn test_alias_from_rest_without_target() {
        let description = RestDomainDescription::default();
        let err = alias_from_rest("api.example.com", EndpointType::Edge, &description).unwrap_err();
        assert!(matches!(err, RegistrarError::MalformedResponse { .. }));
    }

    #[test]
    fn test_alias_from_description_requires_configuration() {
        let description = DomainNameDescription {
            domain_name: "api.example.com".to_string(),
            domain_name_configurations: vec![],
        };

        let err = alias_from_description("api.example.com", &description).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unexpected response for custom domain api.example.com: no endpoint configuration"
        );
    }

    #[tokio::test]
    async fn test_lookup_existing_domain() {
        let gateway =
            FakeGateway::new().with_domain("api.example.com", "d1.cloudfront.net", "ZEDGE");
        let registrar = DomainRegistrar::new(gateway.services().registration);

        let alias = registrar.lookup(&spec("api.example.com")).await.unwrap();
        assert_eq!(alias.target, "d1.cloudfront.net");
        assert_eq!(alias.hosted_zone_id, "ZEDGE");
    }

    #[tokio::test]
    async fn test_lookup_missing_domain_is_a_signal() {
        let gateway = FakeGateway::new();
        let registrar = DomainRegistrar::new(gateway.services().registration);

        let err = registrar.lookup(&spec("api.example.com")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_fatal() {
        let gateway = FakeGateway::new().fail(
            "GetDomainName",
            "api.example.com",
            RemoteError::Service {
                operation: "GetDomainName".to_string(),
                reason: "HTTP 500".to_string(),
            },
        );
        let registrar = DomainRegistrar::new(gateway.services().registration);

        let err = registrar.lookup(&spec("api.example.com")).await.unwrap_err();
        assert_eq!(err.status_reason(), "DomainLookupFailed");
    }

    #[tokio::test]
    async fn test_create_rest_edge_domain() {
        let gateway = FakeGateway::new();
        let registrar = DomainRegistrar::new(gateway.services().registration);

        let alias = registrar
            .create(&with_certificate(spec("api.example.com")))
            .await
            .unwrap();

        assert!(alias.target.ends_with(".cloudfront.net"));
        assert_eq!(alias.hosted_zone_id, "Z2FDTNDATAQYW2");
        assert!(gateway.has_domain("api.example.com"));
        assert_eq!(gateway.state.lock().unwrap().rest_requests.len(), 1);
    }

    #[tokio::test]
    async fn test_create_websocket_domain() {
        let gateway = FakeGateway::new();
        let registrar = DomainRegistrar::new(gateway.services().registration);
        let spec = with_certificate(spec_from_yaml(
            r"
domainName: ws.example.com
websocket: true
",
        ));

        let alias = registrar.create(&spec).await.unwrap();
        assert_eq!(alias.hosted_zone_id, REGIONAL_ZONE_ID);

        let state = gateway.state.lock().unwrap();
        assert!(state.rest_requests.is_empty());
        let request = &state.websocket_requests[0];
        assert_eq!(
            request.domain_name_configurations[0].endpoint_type,
            Some(EndpointType::Regional)
        );
        assert_eq!(
            request.domain_name_configurations[0].certificate_arn.as_deref(),
            Some("arn:cert")
        );
    }

    #[tokio::test]
    async fn test_create_requires_certificate() {
        let gateway = FakeGateway::new();
        let registrar = DomainRegistrar::new(gateway.services().registration);

        let err = registrar.create(&spec("api.example.com")).await.unwrap_err();
        assert_eq!(err.status_reason(), "DomainCreationFailed");
        assert_eq!(gateway.calls("CreateDomainName"), 0);
    }

    #[tokio::test]
    async fn test_create_throttle_is_a_signal() {
        let gateway = FakeGateway::new().throttle("CreateDomainName", 1);
        let registrar = DomainRegistrar::new(gateway.services().registration);
        let spec = with_certificate(spec("api.example.com"));

        assert!(registrar.create(&spec).await.unwrap_err().is_throttled());
        assert!(registrar.create(&spec).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let gateway =
            FakeGateway::new().with_domain("api.example.com", "d1.cloudfront.net", "ZEDGE");
        let registrar = DomainRegistrar::new(gateway.services().registration);
        let spec = spec("api.example.com");

        registrar.delete(&spec).await.unwrap();
        assert!(!gateway.has_domain("api.example.com"));

        // Already gone
        registrar.delete(&spec).await.unwrap();
        assert_eq!(gateway.calls("DeleteDomainName"), 2);
    }

    #[tokio::test]
    async fn test_delete_failure() {
        let gateway = FakeGateway::new().fail(
            "DeleteDomainName",
            "api.example.com",
            RemoteError::Service {
                operation: "DeleteDomainName".to_string(),
                reason: "conflict".to_string(),
            },
        );
        let registrar = DomainRegistrar::new(gateway.services().registration);

        let err = registrar.delete(&spec("api.example.com")).await.unwrap_err();
        assert_eq!(
            err,
            DomainError::Registrar(RegistrarError::DeleteFailed {
                domain: "api.example.com".to_string(),
                reason: "DeleteDomainName failed: conflict".to_string(),
            })
        );
    }
}
