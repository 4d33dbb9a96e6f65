//! Page routes

use warp::Filter;

use crate::infrastructure::http::handlers::{handle_index, handle_success};

pub struct PageRoutes;

impl PageRoutes {
    pub fn create_routes() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let index = warp::path::end().and(warp::get()).and_then(handle_index);
        let success = warp::path!("success").and(warp::get()).and_then(handle_success);

        index.or(success)
    }
}
