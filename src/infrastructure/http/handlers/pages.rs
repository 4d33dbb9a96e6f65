//! Static checkout pages

const INDEX_HTML: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html"));
const SUCCESS_HTML: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/success.html"));

pub async fn handle_index() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::html(INDEX_HTML))
}

pub async fn handle_success() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::html(SUCCESS_HTML))
}
