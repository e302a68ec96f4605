use crate::models::*;
use crate::schema::questions;
use crate::sql_funcs::random;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::QueryResult;

pub struct QuestionListing {
    pub total: i64,
    pub rows: Vec<Question>,
}

/// Paginated listing, newest first.
pub fn list_questions(
    conn: &PgConnection,
    page: i64,
    limit: i64,
    difficulty: Option<Difficulty>,
) -> QueryResult<QuestionListing> {
    let total = match difficulty {
        Some(d) => questions::table
            .filter(questions::difficulty.eq(d.as_str()))
            .count()
            .get_result(conn)?,
        None => questions::table.count().get_result(conn)?,
    };
    let mut query = questions::table.into_boxed();
    if let Some(d) = difficulty {
        query = query.filter(questions::difficulty.eq(d.as_str()));
    }
    let rows = query
        .order(questions::created_at.desc())
        .limit(limit)
        .offset((page - 1) * limit)
        .load(conn)?;
    Ok(QuestionListing { total, rows })
}

pub fn create_question(conn: &PgConnection, data: &QuestionData) -> QueryResult<Question> {
    diesel::insert_into(questions::table)
        .values(data.as_record())
        .get_result(conn)
}

/// Full replace of the mutable fields. `None` means the id is unknown.
/// `created_at` and `used_at` are left untouched.
pub fn update_question(
    conn: &PgConnection,
    id: i32,
    data: &QuestionData,
) -> QueryResult<Option<Question>> {
    diesel::update(questions::table.find(id))
        .set(data.as_record())
        .get_result(conn)
        .optional()
}

pub fn delete_question(conn: &PgConnection, id: i32) -> QueryResult<bool> {
    let affected = diesel::delete(questions::table.find(id)).execute(conn)?;
    Ok(affected > 0)
}

/// Draw: a randomly ordered sample of unused questions matching the filters.
/// Each call re-samples independently; an empty result is the normal
/// "exhausted" signal, not an error.
pub fn draw_questions(
    conn: &PgConnection,
    limit: i64,
    difficulty: Option<Difficulty>,
    type_: Option<QuestionType>,
) -> QueryResult<Vec<Question>> {
    let mut query = questions::table
        .filter(questions::used_at.is_null())
        .into_boxed();
    if let Some(d) = difficulty {
        query = query.filter(questions::difficulty.eq(d.as_str()));
    }
    if let Some(t) = type_ {
        query = query.filter(questions::type_.eq(t.db_label()));
    }
    query.order(random).limit(limit).load(conn)
}

/// Consumption gate. A single conditional UPDATE guards the unused→used
/// transition, so at most one concurrent caller can win it; `None` means
/// the question is already used or does not exist.
pub fn mark_used(conn: &PgConnection, id: i32) -> QueryResult<Option<DateTime<Utc>>> {
    let row: Option<Question> = diesel::update(
        questions::table
            .find(id)
            .filter(questions::used_at.is_null()),
    )
    .set(questions::used_at.eq(Some(Utc::now())))
    .get_result(conn)
    .optional()?;
    Ok(row.and_then(|q| q.used_at))
}

/// External edit escape hatch for `used_at`; this is the only path that
/// ever clears it. Returns the number of rows reset.
pub fn reset_used(conn: &PgConnection, id: Option<i32>) -> QueryResult<usize> {
    let unset = None::<DateTime<Utc>>;
    match id {
        Some(id) => diesel::update(questions::table.find(id))
            .set(questions::used_at.eq(unset))
            .execute(conn),
        None => diesel::update(questions::table)
            .set(questions::used_at.eq(unset))
            .execute(conn),
    }
}
