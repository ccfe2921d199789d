//! 折扣 API
//!
//! 列表 / 邻近查询 / 单条读取 / 管理端 CRUD。

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, Result as ActixResult, web};
use tracing::{error, info, trace};

use crate::api::types::{
    DiscountResponse, ErrorCode, NearbyDiscountResponse, NearbyQuery, error_response,
    success_response,
};
use crate::geoip::LocationResolver;
use crate::repository::{DiscountRepository, NewDiscount};
use crate::services::{DEFAULT_RESULT_LIMIT, ProximityEngine, Ranked};
use crate::utils::{extract_client_ip, validate_coordinate, validate_max_distance};

use super::MAX_SEARCH_RADIUS_KM;

pub struct DiscountService;

impl DiscountService {
    /// 获取所有折扣
    pub async fn get_all_discounts(
        repository: web::Data<Arc<dyn DiscountRepository>>,
    ) -> ActixResult<impl Responder> {
        trace!("Discount API: request to list all discounts");

        let discounts = repository.load_discounts().await;

        if discounts.is_empty() {
            return Ok(error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::DiscountNotFound,
                "No discounts available.",
            ));
        }

        let names = retailer_names(&repository, discounts.iter().map(|d| d.retailer_id)).await;

        let response: Vec<DiscountResponse> = discounts
            .into_iter()
            .map(|d| {
                let name = names.get(&d.retailer_id).cloned();
                DiscountResponse::from_discount(d, name)
            })
            .collect();

        info!("Discount API: returning {} discounts", response.len());
        Ok(success_response(response))
    }

    /// 邻近折扣查询
    ///
    /// 解析客户端 IP → 解析位置 → 按测地距离排序，可选 max_distance 半径裁剪。
    pub async fn get_nearby_discounts(
        req: HttpRequest,
        query: web::Query<NearbyQuery>,
        repository: web::Data<Arc<dyn DiscountRepository>>,
        resolver: web::Data<LocationResolver>,
    ) -> ActixResult<impl Responder> {
        let Some(client_ip) = extract_client_ip(&req) else {
            error!("Discount API: unable to determine client IP");
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::BadRequest,
                "Unable to determine client IP address.",
            ));
        };

        trace!("Discount API: nearby query from {}", client_ip);

        let Some(location) = resolver.resolve(&client_ip).await else {
            info!("Discount API: location unknown for {}", client_ip);
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
                    info!("Discount API: invalid max_distance '{}'", raw);
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
            .discounts_within(&location.coordinate, max_km.unwrap_or(MAX_SEARCH_RADIUS_KM))
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Discount API: spatial query failed: {}", e);
                return Ok(error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalServerError,
                    "Failed to query discounts.",
                ));
            }
        };

        let ranked: Vec<Ranked<_>> = ProximityEngine::rank(
            &location.coordinate,
            candidates,
            max_km,
            DEFAULT_RESULT_LIMIT,
        );

        if ranked.is_empty() {
            return Ok(error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::DiscountNotFound,
                "No discounts found near your location.",
            ));
        }

        let names =
            retailer_names(&repository, ranked.iter().map(|r| r.record.retailer_id)).await;

        let response: Vec<NearbyDiscountResponse> = ranked
            .into_iter()
            .map(|r| {
                let name = names.get(&r.record.retailer_id).cloned();
                NearbyDiscountResponse::from_ranked(r, name)
            })
            .collect();

        info!(
            "Discount API: returning {} nearby discounts for {}",
            response.len(),
            client_ip
        );
        Ok(success_response(response))
    }

    /// 获取单个折扣
    pub async fn get_discount(
        id: web::Path<i64>,
        repository: web::Data<Arc<dyn DiscountRepository>>,
    ) -> ActixResult<impl Responder> {
        let id = id.into_inner();
        trace!("Discount API: get discount request - id: {}", id);

        match repository.get_discount(id).await {
            Some(discount) => {
                let name = repository
                    .get_retailer(discount.retailer_id)
                    .await
                    .map(|r| r.name);
                Ok(success_response(DiscountResponse::from_discount(
                    discount, name,
                )))
            }
            None => Ok(error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::DiscountNotFound,
                "Discount not found.",
            )),
        }
    }

    /// 创建折扣
    pub async fn post_discount(
        new: web::Json<NewDiscount>,
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

        if repository.get_retailer(new.retailer_id).await.is_none() {
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::RetailerNotFound,
                "Retailer does not exist.",
            ));
        }

        match repository.insert_discount(new).await {
            Ok(discount) => {
                info!("Discount API: discount created - {}", discount.discount_code);
                let name = repository
                    .get_retailer(discount.retailer_id)
                    .await
                    .map(|r| r.name);
                Ok(HttpResponse::Created()
                    .append_header(("Content-Type", "application/json; charset=utf-8"))
                    .json(crate::api::types::ApiResponse {
                        code: ErrorCode::Success as i32,
                        message: "Created".to_string(),
                        data: Some(DiscountResponse::from_discount(discount, name)),
                    }))
            }
            Err(e) => {
                error!("Discount API: failed to create discount: {}", e);
                Ok(error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalServerError,
                    e.message(),
                ))
            }
        }
    }

    /// 删除折扣
    pub async fn delete_discount(
        id: web::Path<i64>,
        repository: web::Data<Arc<dyn DiscountRepository>>,
    ) -> ActixResult<impl Responder> {
        let id = id.into_inner();
        info!("Discount API: delete discount request - id: {}", id);

        match repository.remove_discount(id).await {
            Ok(()) => Ok(success_response(serde_json::json!({
                "message": "Discount deleted successfully"
            }))),
            Err(e) => Ok(error_response(
                StatusCode::NOT_FOUND,
                ErrorCode::DiscountNotFound,
                e.message(),
            )),
        }
    }
}

/// 批量查询涉及的商家名称，按 retailer_id 去重
async fn retailer_names(
    repository: &web::Data<Arc<dyn DiscountRepository>>,
    retailer_ids: impl Iterator<Item = i64>,
) -> HashMap<i64, String> {
    let mut names = HashMap::new();

    for id in retailer_ids {
        if names.contains_key(&id) {
            continue;
        }
        if let Some(retailer) = repository.get_retailer(id).await {
            names.insert(id, retailer.name);
        }
    }

    names
}

/// 折扣路由 `/discounts`
///
/// 包含：
/// - GET /discounts - 获取所有折扣
/// - POST /discounts - 创建折扣
/// - GET /discounts/nearby - 邻近折扣查询（必须在 /{id} 之前注册）
/// - GET /discounts/{id} - 获取单个折扣
/// - DELETE /discounts/{id} - 删除折扣
pub fn discount_routes() -> actix_web::Scope {
    web::scope("/discounts")
        .route("", web::get().to(DiscountService::get_all_discounts))
        .route("", web::post().to(DiscountService::post_discount))
        .route(
            "/nearby",
            web::get().to(DiscountService::get_nearby_discounts),
        )
        .route("/{id}", web::get().to(DiscountService::get_discount))
        .route("/{id}", web::delete().to(DiscountService::delete_discount))
}
