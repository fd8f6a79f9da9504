use actix_web::{http::header, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use futures_util::StreamExt;
use log::{error, info};
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::{current_user, NOT_AUTHENTICATED};
use crate::models::task::{CreateTaskRequest, Task, TaskStatus, UpdateTaskRequest};

/// One message for both "no such task" and "someone else's task", so ids
/// cannot be probed for existence.
const TASK_NOT_FOUND: &str = "Task not found";

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Option<Vec<Task>>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: Option<Task>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteTaskResponse {
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub filter: Option<String>,
    pub sort: Option<String>,
}

/// Every task query goes through this guard. `task_id` narrows the scope to
/// a single row; the owner predicate is never optional.
fn owned_by(owner_id: &str, task_id: Option<&str>) -> Document {
    let mut filter = doc! { "owner_id": owner_id };
    if let Some(id) = task_id {
        filter.insert("_id", id);
    }
    filter
}

/// List filter: owner first, then the optional status. `all`, absent, and
/// unrecognized values mean the full list.
fn list_filter(owner_id: &str, status: Option<&str>) -> Document {
    let mut filter = owned_by(owner_id, None);
    match status {
        None | Some("all") => {}
        Some(value) => {
            if let Some(status) = TaskStatus::parse(value) {
                filter.insert("status", status.as_str());
            }
        }
    }
    filter
}

/// `sort=asc|desc` orders by due date; otherwise newest first by creation
/// time. The two modes never combine.
fn sort_doc(sort: Option<&str>) -> Document {
    match sort {
        Some("asc") => doc! { "due_date": 1 },
        Some("desc") => doc! { "due_date": -1 },
        _ => doc! { "created_at": -1 },
    }
}

/// Empty descriptions are stored as null, not "".
fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.is_empty())
}

fn update_doc(payload: &UpdateTaskRequest) -> Document {
    let mut update = doc! {};
    if let Some(title) = &payload.title {
        update.insert("title", title);
    }
    if let Some(description) = &payload.description {
        update.insert("description", description);
    }
    if let Some(due_date) = &payload.due_date {
        update.insert("due_date", due_date.to_string());
    }
    if let Some(status) = &payload.status {
        update.insert("status", status.as_str());
    }
    update
}

/// GET /dashboard/tasks
pub async fn get_tasks(
    req: HttpRequest,
    data: web::Data<AppState>,
    query: web::Query<TaskListQuery>,
) -> impl Responder {
    let owner_id = match current_user(&req) {
        Some(uid) => uid,
        None => {
            return HttpResponse::Unauthorized().json(TaskListResponse {
                tasks: None,
                error: Some(NOT_AUTHENTICATED.to_string()),
            });
        }
    };

    // A still-valid cached payload revalidates without touching the store.
    let etag = data.dashboard_cache.etag(&owner_id);
    let not_modified = req
        .headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == etag)
        .unwrap_or(false);
    if not_modified {
        return HttpResponse::NotModified().finish();
    }

    let filter = list_filter(&owner_id, query.filter.as_deref());
    let mut cursor = match data
        .mongodb
        .tasks()
        .find(filter)
        .sort(sort_doc(query.sort.as_deref()))
        .await
    {
        Ok(cursor) => cursor,
        Err(e) => {
            error!("Error fetching tasks: {}", e);
            return HttpResponse::InternalServerError().json(TaskListResponse {
                tasks: None,
                error: Some(e.to_string()),
            });
        }
    };

    let mut tasks = Vec::new();
    while let Some(task_res) = cursor.next().await {
        match task_res {
            Ok(task) => tasks.push(task),
            Err(e) => {
                error!("Error reading tasks cursor: {}", e);
                return HttpResponse::InternalServerError().json(TaskListResponse {
                    tasks: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    HttpResponse::Ok()
        .insert_header((header::ETAG, etag))
        .insert_header((header::CACHE_CONTROL, "private, no-cache"))
        .json(TaskListResponse {
            tasks: Some(tasks),
            error: None,
        })
}

/// POST /dashboard/tasks
pub async fn create_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateTaskRequest>,
) -> impl Responder {
    let owner_id = match current_user(&req) {
        Some(uid) => uid,
        None => {
            return HttpResponse::Unauthorized().json(TaskResponse {
                task: None,
                error: Some(NOT_AUTHENTICATED.to_string()),
            });
        }
    };

    if payload.title.is_empty() {
        return HttpResponse::BadRequest().json(TaskResponse {
            task: None,
            error: Some("Title is required".to_string()),
        });
    }

    let new_task = Task {
        task_id: Uuid::new_v4().to_string(),
        // Owner comes from the session; any owner field in the payload was
        // already dropped by serde.
        owner_id,
        title: payload.title.clone(),
        description: normalize_description(payload.description.clone()),
        due_date: payload.due_date,
        status: payload.status,
        created_at: Utc::now(),
    };

    match data.mongodb.tasks().insert_one(&new_task).await {
        Ok(_) => {
            info!("Task created: {}", new_task.task_id);
            data.dashboard_cache.invalidate();
            HttpResponse::Ok().json(TaskResponse {
                task: Some(new_task),
                error: None,
            })
        }
        Err(e) => {
            error!("Error inserting task: {}", e);
            HttpResponse::InternalServerError().json(TaskResponse {
                task: None,
                error: Some(e.to_string()),
            })
        }
    }
}

/// PUT /dashboard/tasks/{task_id}
pub async fn update_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateTaskRequest>,
) -> impl Responder {
    let owner_id = match current_user(&req) {
        Some(uid) => uid,
        None => {
            return HttpResponse::Unauthorized().json(TaskResponse {
                task: None,
                error: Some(NOT_AUTHENTICATED.to_string()),
            });
        }
    };
    let task_id = path.into_inner();

    let update = update_doc(&payload);
    if update.is_empty() {
        return HttpResponse::BadRequest().json(TaskResponse {
            task: None,
            error: Some("No fields to update".to_string()),
        });
    }

    match data
        .mongodb
        .tasks()
        .find_one_and_update(owned_by(&owner_id, Some(&task_id)), doc! { "$set": update })
        .return_document(ReturnDocument::After)
        .await
    {
        Ok(Some(task)) => {
            info!("Task updated: {}", task.task_id);
            data.dashboard_cache.invalidate();
            HttpResponse::Ok().json(TaskResponse {
                task: Some(task),
                error: None,
            })
        }
        Ok(None) => HttpResponse::NotFound().json(TaskResponse {
            task: None,
            error: Some(TASK_NOT_FOUND.to_string()),
        }),
        Err(e) => {
            error!("Error updating task: {}", e);
            HttpResponse::InternalServerError().json(TaskResponse {
                task: None,
                error: Some(e.to_string()),
            })
        }
    }
}

/// DELETE /dashboard/tasks/{task_id}
pub async fn delete_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let owner_id = match current_user(&req) {
        Some(uid) => uid,
        None => {
            return HttpResponse::Unauthorized().json(DeleteTaskResponse {
                success: false,
                error: Some(NOT_AUTHENTICATED.to_string()),
            });
        }
    };
    let task_id = path.into_inner();

    match data
        .mongodb
        .tasks()
        .delete_one(owned_by(&owner_id, Some(&task_id)))
        .await
    {
        Ok(result) if result.deleted_count == 0 => HttpResponse::NotFound().json(DeleteTaskResponse {
            success: false,
            error: Some(TASK_NOT_FOUND.to_string()),
        }),
        Ok(_) => {
            info!("Task deleted: {}", task_id);
            data.dashboard_cache.invalidate();
            HttpResponse::Ok().json(DeleteTaskResponse {
                success: true,
                error: None,
            })
        }
        Err(e) => {
            error!("Error deleting task: {}", e);
            HttpResponse::InternalServerError().json(DeleteTaskResponse {
                success: false,
                error: Some(e.to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DashboardCache;
    use crate::config::Config;
    use crate::db::MongoDB;
    use actix_web::{test as atest, web, App};
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[test]
    fn owner_filter_always_carries_the_owner() {
        assert_eq!(owned_by("user-a", None), doc! { "owner_id": "user-a" });
        assert_eq!(
            owned_by("user-a", Some("task-1")),
            doc! { "owner_id": "user-a", "_id": "task-1" }
        );
    }

    #[test]
    fn list_filter_applies_owner_before_status() {
        let filter = list_filter("user-a", Some("done"));
        let keys: Vec<&str> = filter.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["owner_id", "status"]);
        assert_eq!(filter.get_str("status").unwrap(), "done");
    }

    #[test]
    fn list_filter_ignores_all_and_unknown_statuses() {
        assert_eq!(list_filter("u", None), doc! { "owner_id": "u" });
        assert_eq!(list_filter("u", Some("all")), doc! { "owner_id": "u" });
        assert_eq!(list_filter("u", Some("blocked")), doc! { "owner_id": "u" });
    }

    #[test]
    fn sort_modes_are_exclusive() {
        assert_eq!(sort_doc(Some("asc")), doc! { "due_date": 1 });
        assert_eq!(sort_doc(Some("desc")), doc! { "due_date": -1 });
        assert_eq!(sort_doc(None), doc! { "created_at": -1 });
        assert_eq!(sort_doc(Some("sideways")), doc! { "created_at": -1 });
    }

    #[test]
    fn empty_description_becomes_null() {
        assert_eq!(normalize_description(Some(String::new())), None);
        assert_eq!(normalize_description(None), None);
        assert_eq!(
            normalize_description(Some("notes".to_string())),
            Some("notes".to_string())
        );
    }

    #[test]
    fn update_doc_keeps_only_supplied_fields() {
        let update = update_doc(&UpdateTaskRequest {
            title: None,
            description: None,
            due_date: Some(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
            status: Some(TaskStatus::Done),
        });
        assert_eq!(
            update,
            doc! { "due_date": "2025-03-01", "status": "done" }
        );

        let empty = update_doc(&UpdateTaskRequest {
            title: None,
            description: None,
            due_date: None,
            status: None,
        });
        assert!(empty.is_empty());
    }

    async fn test_state() -> AppState {
        // Lazy driver: never connects unless a handler reaches the store.
        AppState {
            mongodb: Arc::new(MongoDB::init("mongodb://127.0.0.1:27017", "task_tracker_test").await),
            config: Config {
                mongo_uri: "mongodb://127.0.0.1:27017".to_string(),
                database_name: "task_tracker_test".to_string(),
                jwt_secret: "tasks-test-secret".to_string(),
                frontend_origin: "http://localhost:3000".to_string(),
                bind_addr: "127.0.0.1:0".to_string(),
            },
            dashboard_cache: Arc::new(DashboardCache::default()),
        }
    }

    // The app is built without the route gate: these exercise the action
    // layer's own session check.
    macro_rules! action_app {
        () => {
            atest::init_service(
                App::new()
                    .app_data(web::Data::new(test_state().await))
                    .route("/dashboard/tasks", web::get().to(get_tasks))
                    .route("/dashboard/tasks", web::post().to(create_task))
                    .route("/dashboard/tasks/{task_id}", web::put().to(update_task))
                    .route("/dashboard/tasks/{task_id}", web::delete().to(delete_task)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn unauthenticated_list_short_circuits() {
        let app = action_app!();
        let req = atest::TestRequest::get().uri("/dashboard/tasks").to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = atest::read_body_json(resp).await;
        assert!(body["tasks"].is_null());
        assert_eq!(body["error"], NOT_AUTHENTICATED);
    }

    #[actix_web::test]
    async fn unauthenticated_create_short_circuits() {
        let app = action_app!();
        let req = atest::TestRequest::post()
            .uri("/dashboard/tasks")
            .set_json(serde_json::json!({
                "title": "x",
                "due_date": "2025-01-01",
                "status": "todo"
            }))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = atest::read_body_json(resp).await;
        assert!(body["task"].is_null());
        assert_eq!(body["error"], NOT_AUTHENTICATED);
    }

    #[actix_web::test]
    async fn unauthenticated_update_and_delete_short_circuit() {
        let app = action_app!();

        let req = atest::TestRequest::put()
            .uri("/dashboard/tasks/task-1")
            .set_json(serde_json::json!({ "status": "done" }))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);

        let req = atest::TestRequest::delete()
            .uri("/dashboard/tasks/task-1")
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = atest::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], NOT_AUTHENTICATED);
    }
}
