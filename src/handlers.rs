use actix_web::{error, get, patch, web, HttpRequest, HttpResponse, Responder};

use crate::analytics;
use crate::errors::ReviewError;
use crate::filters::{filter_reviews, ReviewQuery};
use crate::models::{ApiResponse, ApprovalRequest, ReviewListResponse};
use crate::store::ReviewStore;

/// Register the API routes and the extractor error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(
            web::scope("/api/v1")
                // Health
                .service(health_check)
                // Moderation
                .service(list_reviews)
                .service(update_review_approval)
                // Properties
                .service(list_properties)
                .service(get_property_reviews)
                // Analytics
                .service(get_property_performance)
                .service(get_negative_trends)
                .service(get_dashboard_summary),
        );
}

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::warn!("Rejected request body: {err}");
    let response = HttpResponse::BadRequest()
        .json(ApiResponse::<()>::error(format!("Invalid request body: {err}")));
    error::InternalError::from_response(err, response).into()
}

fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::warn!("Rejected query string: {err}");
    let response = HttpResponse::BadRequest()
        .json(ApiResponse::<()>::error(format!("Invalid query string: {err}")));
    error::InternalError::from_response(err, response).into()
}

fn error_response(err: ReviewError) -> HttpResponse {
    match err {
        ReviewError::Validation(_) => {
            log::warn!("{err}");
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(err.to_string()))
        }
        ReviewError::NotFound(_) | ReviewError::ListingNotFound(_) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error(err.to_string()))
        }
        ReviewError::Internal(_) => {
            log::error!("{err}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error".into()))
        }
    }
}

// ============================================================================
// HEALTH CHECK
// ============================================================================

#[get("/health")]
pub async fn health_check(store: web::Data<ReviewStore>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "review-moderation-service",
        "reviews": store.len(),
        "timestamp": chrono::Utc::now()
    }))
}

// ============================================================================
// MODERATION
// ============================================================================

#[get("/reviews")]
pub async fn list_reviews(
    store: web::Data<ReviewStore>,
    query: web::Query<ReviewQuery>,
) -> impl Responder {
    let filter = match query.into_inner().into_filter() {
        Ok(filter) => filter,
        Err(err) => return error_response(err),
    };
    if !filter.is_empty() {
        log::debug!("Filtering reviews with {filter:?}");
    }

    let reviews = filter_reviews(&store.list().await, &filter);
    HttpResponse::Ok().json(ApiResponse::success(ReviewListResponse {
        total: reviews.len(),
        reviews,
    }))
}

#[patch("/reviews")]
pub async fn update_review_approval(
    store: web::Data<ReviewStore>,
    payload: web::Json<ApprovalRequest>,
) -> impl Responder {
    let ApprovalRequest {
        review_id,
        approved,
    } = payload.into_inner();

    if let Err(err) = store.set_approval(review_id, approved).await {
        return error_response(err);
    }

    match store.get(review_id).await {
        Some(review) => HttpResponse::Ok().json(ApiResponse::success(review)),
        None => error_response(ReviewError::Internal(format!(
            "Review {review_id} vanished after approval update"
        ))),
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[get("/properties")]
pub async fn list_properties(store: web::Data<ReviewStore>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(store.list_properties()))
}

/// Public listing page: only approved reviews are exposed.
#[get("/properties/{listing_name}/reviews")]
pub async fn get_property_reviews(
    store: web::Data<ReviewStore>,
    listing_name: web::Path<String>,
) -> impl Responder {
    let listing_name = listing_name.into_inner();
    if !store.list_properties().contains(&listing_name) {
        return error_response(ReviewError::ListingNotFound(listing_name));
    }

    let page = analytics::property_reviews(&store.list().await, &listing_name);
    HttpResponse::Ok().json(ApiResponse::success(page))
}

// ============================================================================
// ANALYTICS
// ============================================================================

// Analytics always describe the whole portfolio, never the current filter.

#[get("/analytics/performance")]
pub async fn get_property_performance(store: web::Data<ReviewStore>) -> impl Responder {
    let performance = analytics::property_performance(&store.list().await);
    HttpResponse::Ok().json(ApiResponse::success(performance))
}

#[get("/analytics/trends")]
pub async fn get_negative_trends(store: web::Data<ReviewStore>) -> impl Responder {
    let trends = analytics::negative_trends(&store.list().await);
    HttpResponse::Ok().json(ApiResponse::success(trends))
}

#[get("/analytics/summary")]
pub async fn get_dashboard_summary(store: web::Data<ReviewStore>) -> impl Responder {
    let stats = analytics::dashboard_stats(&store.list().await);
    HttpResponse::Ok().json(ApiResponse::success(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    const KINGS_CROSS: &str = "/api/v1/properties/Studio%20S1%20C%20-%208%20King's%20Cross%20Plaza/reviews";

    fn store() -> web::Data<ReviewStore> {
        web::Data::new(ReviewStore::seeded().expect("embedded feed"))
    }

    fn review_ids(body: &Value) -> Vec<i64> {
        body["data"]["reviews"]
            .as_array()
            .unwrap()
            .iter()
            .map(|review| review["id"].as_i64().unwrap())
            .collect()
    }

    #[actix_web::test]
    async fn health_reports_review_count() {
        let app = test::init_service(App::new().app_data(store()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["reviews"], 8);
    }

    #[actix_web::test]
    async fn lists_all_reviews_newest_first() {
        let app = test::init_service(App::new().app_data(store()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/v1/reviews").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["total"], 8);
        assert_eq!(review_ids(&body)[0], 7454);
    }

    #[actix_web::test]
    async fn applies_query_filters() {
        let app = test::init_service(App::new().app_data(store()).configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/api/v1/reviews?listingName=2B%20N1%20A%20-%2029%20Shoreditch%20Heights&approved=true&type=all")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(review_ids(&body), vec![7454, 7453]);
        assert_eq!(body["data"]["total"], 2);
    }

    #[actix_web::test]
    async fn bad_date_is_a_bad_request() {
        let app = test::init_service(App::new().app_data(store()).configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/api/v1/reviews?dateFrom=not-a-date")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("dateFrom"));
    }

    #[actix_web::test]
    async fn well_formed_criteria_never_fail() {
        let app = test::init_service(App::new().app_data(store()).configure(configure)).await;

        for (uri, total) in [
            ("/api/v1/reviews?dateFrom=2023-11-10&dateTo=2023-11-01", 0),
            ("/api/v1/reviews?minRating=11", 0),
            ("/api/v1/reviews?minRating=-1", 8),
            ("/api/v1/reviews?rating=0&minRating=0", 8),
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["data"]["total"], total, "{uri}");
        }
    }

    #[actix_web::test]
    async fn approval_update_round_trip() {
        let app = test::init_service(App::new().app_data(store()).configure(configure)).await;

        let req = test::TestRequest::patch()
            .uri("/api/v1/reviews")
            .set_json(json!({ "reviewId": 7455, "approved": true }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["id"], 7455);
        assert_eq!(body["data"]["approved"], true);

        let req = test::TestRequest::get()
            .uri("/api/v1/reviews?approved=false")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(review_ids(&body), vec![7457, 7459]);
    }

    #[actix_web::test]
    async fn unknown_review_is_not_found() {
        let app = test::init_service(App::new().app_data(store()).configure(configure)).await;
        let req = test::TestRequest::patch()
            .uri("/api/v1/reviews")
            .set_json(json!({ "reviewId": 9999, "approved": true }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/v1/reviews").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["total"], 8);
        assert!(!review_ids(&body).contains(&9999));
    }

    #[actix_web::test]
    async fn malformed_approval_body_is_a_bad_request() {
        let app = test::init_service(App::new().app_data(store()).configure(configure)).await;

        for payload in [
            json!({ "reviewId": "7455", "approved": true }),
            json!({ "reviewId": 7455, "approved": "yes" }),
            json!({ "reviewId": 7455.5, "approved": true }),
            json!({ "approved": true }),
        ] {
            let req = test::TestRequest::patch()
                .uri("/api/v1/reviews")
                .set_json(&payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {payload}");

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["success"], false);
        }
    }

    #[actix_web::test]
    async fn lists_properties() {
        let app = test::init_service(App::new().app_data(store()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/v1/properties").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["data"],
            json!([
                "2B N1 A - 29 Shoreditch Heights",
                "1B E2 B - 15 Canary Wharf Tower",
                "Studio S1 C - 8 King's Cross Plaza"
            ])
        );
    }

    #[actix_web::test]
    async fn property_page_follows_approvals() {
        let app = test::init_service(App::new().app_data(store()).configure(configure)).await;

        let req = test::TestRequest::get().uri(KINGS_CROSS).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(review_ids(&body), vec![7458, 7460]);
        assert_eq!(body["data"]["starRating"], 5);

        let req = test::TestRequest::patch()
            .uri("/api/v1/reviews")
            .set_json(json!({ "reviewId": 7459, "approved": true }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri(KINGS_CROSS).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(review_ids(&body), vec![7458, 7459, 7460]);
    }

    #[actix_web::test]
    async fn unknown_property_is_not_found() {
        let app = test::init_service(App::new().app_data(store()).configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/api/v1/properties/Nowhere/reviews")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn analytics_cover_the_whole_portfolio() {
        let app = test::init_service(App::new().app_data(store()).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/api/v1/analytics/performance")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
        assert_eq!(body["data"][0]["averageRating"], 8.5);
        assert_eq!(body["data"][0]["categoryAverages"]["cleanliness"], 9.0);

        let req = test::TestRequest::get().uri("/api/v1/analytics/trends").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0], json!({ "category": "value", "count": 2, "averageRating": 6.0 }));

        let req = test::TestRequest::get().uri("/api/v1/analytics/summary").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["data"],
            json!({ "totalReviews": 8, "approvedReviews": 5, "pendingReviews": 3, "properties": 3 })
        );
    }
}
