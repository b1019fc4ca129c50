use http::header::{CACHE_CONTROL, CONTENT_TYPE};
use http::{HeaderValue, Request, Response};
use relaybox_core::{Predicate, PredicateExt, PredicateResult};
use relaybox_http::RequestMeta;
use relaybox_http::predicates::header::Operation as HeaderOperation;
use relaybox_http::predicates::request::query::Operation as QueryOperation;
use relaybox_http::predicates::request::{HeaderPredicate, MethodPredicate, PathPredicate, QueryPredicate};
use relaybox_http::predicates::response::{StatusClass, StatusCodePredicate};
use relaybox_http::predicates::{NeutralRequestPredicate, NeutralResponsePredicate};

fn request(uri: &str) -> RequestMeta {
    let (parts, _) = Request::get(uri)
        .header(CACHE_CONTROL, "max-age=60")
        .body(())
        .unwrap()
        .into_parts();
    RequestMeta::from_parts(&parts)
}

fn response(status: u16) -> http::response::Parts {
    let (parts, _) = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json; charset=utf-8")
        .body(())
        .unwrap()
        .into_parts();
    parts
}

mod request_tests {
    use super::*;

    #[tokio::test]
    async fn test_method_and_path_chain() {
        let predicate = NeutralRequestPredicate::new()
            .method(http::Method::GET)
            .path("/api/{id}".to_owned());

        assert_eq!(
            predicate.check(&request("/api/42")).await,
            PredicateResult::Cacheable
        );
        assert_eq!(
            predicate.check(&request("/other/42")).await,
            PredicateResult::NonCacheable
        );
    }

    #[tokio::test]
    async fn test_method_mismatch() {
        let predicate = NeutralRequestPredicate::new().method(http::Method::POST);
        assert_eq!(
            predicate.check(&request("/")).await,
            PredicateResult::NonCacheable
        );
    }

    #[tokio::test]
    async fn test_query_operations() {
        let eq = NeutralRequestPredicate::new()
            .query(QueryOperation::Eq("format".into(), "json".into()));
        assert!(eq.check(&request("/?format=json")).await.is_cacheable());
        assert!(!eq.check(&request("/?format=xml")).await.is_cacheable());
        assert!(!eq.check(&request("/")).await.is_cacheable());

        let exist = NeutralRequestPredicate::new().query(QueryOperation::Exist("page".into()));
        assert!(exist.check(&request("/?page=1")).await.is_cacheable());

        let within = NeutralRequestPredicate::new().query(QueryOperation::In(
            "lang".into(),
            vec!["en".into(), "de".into()],
        ));
        assert!(within.check(&request("/?lang=de")).await.is_cacheable());
        assert!(!within.check(&request("/?lang=fr")).await.is_cacheable());
    }

    #[tokio::test]
    async fn test_request_header() {
        let predicate = NeutralRequestPredicate::new().header(HeaderOperation::Eq(
            CACHE_CONTROL,
            HeaderValue::from_static("max-age=60"),
        ));
        assert!(predicate.check(&request("/")).await.is_cacheable());

        let negated = NeutralRequestPredicate::new()
            .header(HeaderOperation::Exist(http::header::AUTHORIZATION))
            .not();
        assert!(negated.check(&request("/")).await.is_cacheable());
    }
}

mod response_tests {
    use super::*;

    #[tokio::test]
    async fn test_status_code() {
        let predicate = NeutralResponsePredicate::new().status_code(http::StatusCode::OK);
        assert!(predicate.check(&response(200)).await.is_cacheable());
        assert!(!predicate.check(&response(404)).await.is_cacheable());
    }

    #[tokio::test]
    async fn test_status_class_and_range() {
        let success = NeutralResponsePredicate::new().status_code_class(StatusClass::Success);
        assert!(success.check(&response(204)).await.is_cacheable());
        assert!(!success.check(&response(301)).await.is_cacheable());

        let range = NeutralResponsePredicate::new()
            .status_code_range(http::StatusCode::OK, http::StatusCode::NOT_MODIFIED);
        assert!(range.check(&response(304)).await.is_cacheable());
        assert!(!range.check(&response(400)).await.is_cacheable());
    }

    #[tokio::test]
    async fn test_response_header_contains() {
        let predicate = NeutralResponsePredicate::new()
            .header(HeaderOperation::Contains(CONTENT_TYPE, "json".to_owned()));
        assert!(predicate.check(&response(200)).await.is_cacheable());
    }
}
