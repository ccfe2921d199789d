//! 商家 API

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use tracing::{error, info, trace};

use crate::api::types::{
    ErrorCode, NearbyQuery, NearbyRetailerResponse, RetailerResponse, error_response,
    success_response,
};
use crate::geoip::LocationResolver;
use crate::repository::{DiscountRepository, NewRetailer};
use crate::services::{DEFAULT_RESULT_LIMIT, ProximityEngine};
use crate::utils::{extract_client_ip, validate_coordinate, validate_max_distance};

use super::MAX_SEARCH_RADIUS_KM;

pub struct RetailerService;

impl RetailerService {
    /// 获取所有商家
    pub async fn get_all_retailers(
        repository: web::Data<Arc<dyn DiscountRepository>>,
    ) -> ActixResult<impl Responder> {
        trace!("Retailer API: request to list all retailers");

        let retailers = repository.load_retailers().await;

        if retailers.is_empty() {
            return Ok(error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::RetailerNotFound,
                "No retailers available.",
            ));
        }

        let response: Vec<RetailerResponse> =
            retailers.into_iter().map(RetailerResponse::from).collect();

        info!("Retailer API: returning {} retailers", response.len());
        Ok(success_response(response))
    }

    /// 邻近商家查询
    pub async fn get_nearby_retailers(
        req: HttpRequest,
        query: web::Query<NearbyQuery>,
        repository: web::Data<Arc<dyn DiscountRepository>>,
        resolver: web::Data<LocationResolver>,
    ) -> ActixResult<impl Responder> {
        let Some(client_ip) = extract_client_ip(&req) else {
            error!("Retailer API: unable to determine client IP");
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::BadRequest,
                "Unable to determine client IP address.",
            ));
        };

        let Some(location) = resolver.resolve(&client_ip).await else {
            info!("Retailer API: location unknown for {}", client_ip);
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::LocationUnavailable,
                "Unable to determine location from IP address.",
            ));
        };

        let max_km = match &query.max_distance {
            Some(raw) => match validate_max_distance(raw) {
                Ok(km) => Some(km),
                Err(e) => {
                    info!("Retailer API: invalid max_distance '{}'", raw);
                    return Ok(error_response(
                        StatusCode::BAD_REQUEST,
                        ErrorCode::InvalidMaxDistance,
                        e.message(),
                    ));
                }
            },
            None => None,
        };

        let candidates = match repository
            .retailers_within(&location.coordinate, max_km.unwrap_or(MAX_SEARCH_RADIUS_KM))
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Retailer API: spatial query failed: {}", e);
                return Ok(error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalServerError,
                    "Failed to query retailers.",
                ));
            }
        };

        let ranked = ProximityEngine::rank(
            &location.coordinate,
            candidates,
            max_km,
            DEFAULT_RESULT_LIMIT,
        );

        if ranked.is_empty() {
            return Ok(error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::RetailerNotFound,
                "No retailers found near your location.",
            ));
        }

        let response: Vec<NearbyRetailerResponse> = ranked
            .into_iter()
            .map(NearbyRetailerResponse::from)
            .collect();

        info!(
            "Retailer API: returning {} nearby retailers for {}",
            response.len(),
            client_ip
        );
        Ok(success_response(response))
    }

    /// 获取单个商家
    pub async fn get_retailer(
        id: web::Path<i64>,
        repository: web::Data<Arc<dyn DiscountRepository>>,
    ) -> ActixResult<impl Responder> {
        let id = id.into_inner();
        trace!("Retailer API: get retailer request - id: {}", id);

        match repository.get_retailer(id).await {
            Some(retailer) => Ok(success_response(RetailerResponse::from(retailer))),
            None => Ok(error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::RetailerNotFound,
                "Retailer not found.",
            )),
        }
    }

    /// 创建商家
    pub async fn post_retailer(
        new: web::Json<NewRetailer>,
        repository: web::Data<Arc<dyn DiscountRepository>>,
    ) -> ActixResult<impl Responder> {
        let new = new.into_inner();

        if let Err(e) = validate_coordinate(new.coordinate.latitude, new.coordinate.longitude) {
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::BadRequest,
                e.message(),
            ));
        }

        match repository.insert_retailer(new).await {
            Ok(retailer) => {
                info!("Retailer API: retailer created - {}", retailer.name);
                Ok(HttpResponse::Created()
                    .append_header(("Content-Type", "application/json; charset=utf-8"))
                    .json(crate::api::types::ApiResponse {
                        code: ErrorCode::Success as i32,
                        message: "Created".to_string(),
                        data: Some(RetailerResponse::from(retailer)),
                    }))
            }
            Err(e) => {
                error!("Retailer API: failed to create retailer: {}", e);
                Ok(error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalServerError,
                    e.message(),
                ))
            }
        }
    }

    /// 删除商家（级联删除其折扣由数据库外键负责）
    pub async fn delete_retailer(
        id: web::Path<i64>,
        repository: web::Data<Arc<dyn DiscountRepository>>,
    ) -> ActixResult<impl Responder> {
        let id = id.into_inner();
        info!("Retailer API: delete retailer request - id: {}", id);

        match repository.remove_retailer(id).await {
            Ok(()) => Ok(success_response(serde_json::json!({
                "message": "Retailer deleted successfully"
            }))),
            Err(e) => Ok(error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::RetailerNotFound,
                e.message(),
            )),
        }
    }
}

/// 商家路由 `/retailers`
///
/// 包含：
/// - GET /retailers - 获取所有商家
/// - POST /retailers - 创建商家
/// - GET /retailers/nearby - 邻近商家查询（必须在 /{id} 之前注册）
/// - GET /retailers/{id} - 获取单个商家
/// - DELETE /retailers/{id} - 删除商家
pub fn retailer_routes() -> actix_web::Scope {
    web::scope("/retailers")
        .route("", web::get().to(RetailerService::get_all_retailers))
        .route("", web::post().to(RetailerService::post_retailer))
        .route(
            "/nearby",
            web::get().to(RetailerService::get_nearby_retailers),
        )
        .route("/{id}", web::get().to(RetailerService::get_retailer))
        .route("/{id}", web::delete().to(RetailerService::delete_retailer))
}
