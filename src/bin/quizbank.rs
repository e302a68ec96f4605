use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{delete, get, middleware, post, put, web, App, HttpResponse, HttpServer};
use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use quizbank::{actions, models};
use serde::Deserialize;
use std::net::SocketAddr;
use structopt::StructOpt;

type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

fn error(message: &str) -> models::ApiError {
    models::ApiError {
        error: message.to_owned(),
    }
}

#[derive(Deserialize)]
struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    difficulty: Option<models::Difficulty>,
}

#[get("/questions")]
async fn api_list(
    pool: web::Data<DbPool>,
    web::Query(query): web::Query<ListQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    let page = query.page.filter(|p| *p > 0).unwrap_or(1);
    let limit = query.limit.filter(|l| (1..=200).contains(l)).unwrap_or(5);
    let difficulty = query.difficulty;
    let db = web::block(move || pool.get()).await?;
    let listing = web::block(move || actions::list_questions(&db, page, limit, difficulty)).await?;
    let data = listing
        .rows
        .into_iter()
        .map(models::QuestionJson::from)
        .collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(models::QuestionPage {
        page,
        limit,
        total: listing.total,
        total_pages: ((listing.total + limit - 1) / limit).max(1),
        count: data.len(),
        data,
    }))
}

#[post("/questions")]
async fn api_create(
    pool: web::Data<DbPool>,
    web::Json(input): web::Json<models::QuestionInput>,
) -> Result<HttpResponse, actix_web::Error> {
    let data = match input.validate() {
        Ok(data) => data,
        Err(e) => return Ok(HttpResponse::BadRequest().json(error(&e.to_string()))),
    };
    let db = web::block(move || pool.get()).await?;
    let row = web::block(move || actions::create_question(&db, &data)).await?;
    Ok(HttpResponse::Created().json(models::QuestionJson::from(row)))
}

#[put("/questions/{id}")]
async fn api_update(
    pool: web::Data<DbPool>,
    id: web::Path<i32>,
    web::Json(input): web::Json<models::QuestionInput>,
) -> Result<HttpResponse, actix_web::Error> {
    let data = match input.validate() {
        Ok(data) => data,
        Err(e) => return Ok(HttpResponse::BadRequest().json(error(&e.to_string()))),
    };
    let id = id.into_inner();
    let db = web::block(move || pool.get()).await?;
    let updated = web::block(move || actions::update_question(&db, id, &data)).await?;
    match updated {
        Some(row) => Ok(HttpResponse::Ok().json(models::QuestionJson::from(row))),
        None => Ok(HttpResponse::NotFound().json(error("question not found"))),
    }
}

#[delete("/questions/{id}")]
async fn api_delete(
    pool: web::Data<DbPool>,
    id: web::Path<i32>,
) -> Result<HttpResponse, actix_web::Error> {
    let id = id.into_inner();
    let db = web::block(move || pool.get()).await?;
    let deleted = web::block(move || actions::delete_question(&db, id)).await?;
    if deleted {
        Ok(HttpResponse::Ok().json(models::ApiMessage {
            message: "question deleted".to_owned(),
        }))
    } else {
        Ok(HttpResponse::NotFound().json(error("question not found")))
    }
}

#[post("/questions/{id}/use")]
async fn api_use(
    pool: web::Data<DbPool>,
    id: web::Path<i32>,
) -> Result<HttpResponse, actix_web::Error> {
    let id = id.into_inner();
    let db = web::block(move || pool.get()).await?;
    let used_at = web::block(move || actions::mark_used(&db, id)).await?;
    match used_at {
        Some(used_at) => Ok(HttpResponse::Ok().json(models::UseResponse {
            message: "question marked as used".to_owned(),
            id,
            used_at,
        })),
        None => Ok(HttpResponse::Conflict().json(error("question not found or already used"))),
    }
}

#[derive(Deserialize)]
struct DrawQuery {
    limit: Option<i64>,
    difficulty: Option<models::Difficulty>,
    #[serde(rename = "type")]
    type_: Option<models::QuestionType>,
}

#[get("/questions/random")]
async fn api_random(
    pool: web::Data<DbPool>,
    web::Query(query): web::Query<DrawQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    let limit = query.limit.filter(|l| (1..=50).contains(l)).unwrap_or(10);
    let difficulty = query.difficulty;
    let type_ = query.type_;
    let db = web::block(move || pool.get()).await?;
    let rows = web::block(move || actions::draw_questions(&db, limit, difficulty, type_)).await?;
    let data = rows.into_iter().map(models::QuestionJson::from).collect::<Vec<_>>();
    let message = if data.is_empty() {
        Some("no more questions available (all have been used)".to_owned())
    } else {
        None
    };
    Ok(HttpResponse::Ok().json(models::DrawResponse {
        limit,
        count: data.len(),
        data,
        message,
    }))
}

fn api() -> actix_web::Scope {
    web::scope("/api")
        .service(api_random)
        .service(api_list)
        .service(api_create)
        .service(api_update)
        .service(api_delete)
        .service(api_use)
}

fn cors() -> actix_cors::CorsFactory {
    Cors::new()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_header(header::CONTENT_TYPE)
        .finish()
}

#[derive(StructOpt)]
struct Args {
    #[structopt(short, long, default_value = "0.0.0.0:5000")]
    bind: SocketAddr,
}

#[actix_rt::main]
async fn main() -> Result<(), exitfailure::ExitFailure> {
    env_logger::init();
    let _ = dotenv::dotenv();
    let args = Args::from_args();

    let db = std::env::var("DATABASE_URL")?;
    let cm = ConnectionManager::new(&db);
    let pool = DbPool::builder().build(cm)?;

    HttpServer::new(move || {
        App::new()
            .data(pool.clone())
            .service(api())
            .wrap(cors())
            .wrap(middleware::Logger::default())
    })
    .bind(&args.bind)?
    .run()
    .await?;
    Ok(())
}
