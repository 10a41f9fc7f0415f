use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;

use crate::api::success::Success;
use crate::api::{error, success};
use crate::middlewares::get_extensions;
use crate::modules::upload::{
    model::{Rejection, UploadedFile},
    schema::{Base64UploadBody, DeleteFileBody, UploadResult},
    service::FileUploadService,
    storage::FileStorage,
};
use crate::utils::{Claims, ValidatedJson};

const FOLDER_FIELD: &str = "folder";
const MAX_TEXT_FIELD_SIZE: usize = 1024;

#[derive(Default)]
struct UploadForm {
    files: Vec<UploadedFile>,
    folder: Option<String>,
}

/// Reads file parts named `file_field` plus an optional `folder` text part.
async fn read_form(
    payload: &mut Multipart,
    file_field: &str,
    max_files: usize,
    max_file_size: usize,
) -> Result<UploadForm, error::Error> {
    let mut form = UploadForm::default();

    while let Some(mut field) =
        payload.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename =
            field.content_disposition().and_then(|cd| cd.get_filename()).map(str::to_string);

        let Some(original_name) = filename else {
            let value = read_field(&mut field, MAX_TEXT_FIELD_SIZE).await?;
            if name == FOLDER_FIELD {
                let folder = String::from_utf8(value)
                    .map_err(|_| error::Error::bad_request("Folder must be valid UTF-8"))?;
                form.folder = Some(folder.trim().to_string()).filter(|f| !f.is_empty());
            }
            continue;
        };

        if name != file_field {
            return Err(error::Error::bad_request(format!("Unexpected field '{}'", name)));
        }
        if form.files.len() == max_files {
            return Err(error::SystemError::from(Rejection::TooManyFiles { max: max_files }).into());
        }

        let mime_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let encoding = field
            .headers()
            .get("content-transfer-encoding")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let buffer = read_field(&mut field, max_file_size).await?;
        let mut file = UploadedFile::new(name, original_name, mime_type, buffer);
        if let Some(encoding) = encoding {
            file = file.with_encoding(encoding);
        }
        form.files.push(file);
    }

    Ok(form)
}

/// Stops reading as soon as the part grows past `limit`.
async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, error::Error> {
    let mut bytes = Vec::new();
    while let Some(chunk) =
        field.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
    {
        if bytes.len() + chunk.len() > limit {
            return Err(error::SystemError::from(Rejection::ExceedsLimit { max: limit }).into());
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

/// Upload a single image
pub async fn upload_image<S>(
    mut payload: Multipart,
    req: HttpRequest,
    service: web::Data<FileUploadService<S>>,
) -> Result<success::Success<UploadResult>, error::Error>
where
    S: FileStorage + Send + Sync + 'static,
{
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let form = read_form(&mut payload, "file", 1, service.config().max_file_size).await?;

    let file = form
        .files
        .into_iter()
        .next()
        .ok_or_else(|| error::Error::bad_request("No file found in request"))?;

    let result = service.upload_one(file, form.folder.as_deref()).await?;
    log::info!("User {} uploaded {}", user_id, result.url);

    Ok(Success::created(Some(result)).message("File uploaded successfully"))
}

/// Upload several images in one request
pub async fn upload_images<S>(
    mut payload: Multipart,
    req: HttpRequest,
    service: web::Data<FileUploadService<S>>,
) -> Result<success::Success<Vec<UploadResult>>, error::Error>
where
    S: FileStorage + Send + Sync + 'static,
{
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let config = service.config();
    let form = read_form(&mut payload, "files", config.max_files, config.max_file_size).await?;

    if form.files.is_empty() {
        return Err(error::Error::bad_request("No files found in request"));
    }

    let results = service.upload_many(form.files, form.folder.as_deref()).await?;
    log::info!("User {} uploaded {} files", user_id, results.len());

    Ok(Success::created(Some(results)).message("Files uploaded successfully"))
}

/// Upload an image sent as a data URI
pub async fn upload_base64<S>(
    body: ValidatedJson<Base64UploadBody>,
    req: HttpRequest,
    service: web::Data<FileUploadService<S>>,
) -> Result<success::Success<UploadResult>, error::Error>
where
    S: FileStorage + Send + Sync + 'static,
{
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let body = body.0;

    let result = service.upload_base64(&body.base64, body.folder.as_deref()).await?;
    log::info!("User {} uploaded {}", user_id, result.url);

    Ok(Success::created(Some(result)).message("File uploaded successfully"))
}

/// Delete a stored file by its public URL
pub async fn delete_file<S>(
    body: ValidatedJson<DeleteFileBody>,
    req: HttpRequest,
    service: web::Data<FileUploadService<S>>,
) -> Result<success::Success<bool>, error::Error>
where
    S: FileStorage + Send + Sync + 'static,
{
    let user_id = get_extensions::<Claims>(&req)?.sub;

    let deleted = service.delete(&body.0.url).await;
    let message = if deleted {
        log::info!("User {} deleted {}", user_id, body.0.url);
        "File deleted successfully"
    } else {
        "File not found"
    };

    Ok(Success::ok(Some(deleted)).message(message))
}

/// Serve a stored file
pub async fn serve_file<S>(
    path: web::Path<(String, String)>,
    service: web::Data<FileUploadService<S>>,
) -> Result<HttpResponse, error::Error>
where
    S: FileStorage + Send + Sync + 'static,
{
    let (folder, filename) = path.into_inner();

    let bytes = service
        .open(&folder, &filename)
        .await?
        .ok_or_else(|| error::Error::not_found("File not found"))?;

    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    Ok(HttpResponse::Ok().content_type(mime.essence_str()).body(bytes))
}

#[cfg(test)]
mod tests {
    use actix_web::{
        body::to_bytes,
        http::{header, StatusCode},
        test, App,
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use crate::configs::{json_config, routes};
    use crate::modules::upload::storage_fs::FsStorage;
    use crate::test::{files_in, upload_service};
    use crate::utils::Claims;

    const SECRET: &str = "test-secret";
    const BOUNDARY: &str = "----farmboundary";

    macro_rules! test_app {
        ($temp:expr) => {
            test_app!($temp, 5 * 1024 * 1024)
        };
        ($temp:expr, $json_max_file_size:expr) => {
            test::init_service(
                App::new()
                    .app_data(actix_web::web::Data::new(upload_service($temp)))
                    .app_data(json_config($json_max_file_size))
                    .configure(routes::<FsStorage>("/uploads".to_string(), SECRET.into())),
            )
            .await
        };
    }

    fn bearer() -> (header::HeaderName, String) {
        let token = Claims::new(&uuid::Uuid::new_v4(), 300).encode(SECRET.as_bytes()).unwrap();
        (header::AUTHORIZATION, format!("Bearer {}", token))
    }

    enum Part<'a> {
        File { field: &'a str, filename: &'a str, mime: &'a str, bytes: Vec<u8> },
        Text { field: &'a str, value: &'a str },
    }

    fn multipart(parts: &[Part<'_>]) -> ((header::HeaderName, String), Vec<u8>) {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::File { field, filename, mime, bytes } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: {}\r\n\r\n",
                            field, filename, mime
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
                Part::Text { field, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field)
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        ((header::CONTENT_TYPE, content_type), body)
    }

    fn png_part<'a>(field: &'a str, filename: &'a str, size: usize) -> Part<'a> {
        Part::File { field, filename, mime: "image/png", bytes: vec![7; size] }
    }

    async fn json_body(res: actix_web::dev::ServiceResponse) -> Value {
        let body = to_bytes(res.into_body()).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[actix_web::test]
    async fn single_upload_returns_result_envelope() {
        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);
        let (content_type, body) = multipart(&[
            png_part("file", "cat.png", 1024),
            Part::Text { field: "folder", value: "plots" },
        ]);

        let req = test::TestRequest::post()
            .uri("/api/upload/image")
            .insert_header(bearer())
            .insert_header(content_type)
            .set_payload(body)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let json = json_body(res).await;
        let data = &json["data"];
        let filename = data["filename"].as_str().unwrap();
        assert!(filename.ends_with(".png"));
        assert_eq!(data["url"], format!("/uploads/plots/{}", filename));
        assert_eq!(data["originalName"], "cat.png");
        assert_eq!(data["size"], 1024);
        assert_eq!(data["mimeType"], "image/png");
        assert_eq!(json["message"], "File uploaded successfully");
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);
        let (content_type, body) = multipart(&[png_part("file", "cat.png", 8)]);

        let req = test::TestRequest::post()
            .uri("/api/upload/image")
            .insert_header(content_type)
            .set_payload(body)
            .to_request();
        let err = test::try_call_service(&app, req).await.err().unwrap();

        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
        assert!(files_in(temp.path()).is_empty());
    }

    #[actix_web::test]
    async fn bad_token_is_forbidden() {
        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);

        let req = test::TestRequest::delete()
            .uri("/api/upload")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
            .set_json(json!({ "url": "/uploads/images/a.png" }))
            .to_request();
        let err = test::try_call_service(&app, req).await.err().unwrap();

        assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn unsupported_type_is_a_client_error() {
        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);
        let (content_type, body) = multipart(&[Part::File {
            field: "file",
            filename: "doc.pdf",
            mime: "application/pdf",
            bytes: b"%PDF-1.7".to_vec(),
        }]);

        let req = test::TestRequest::post()
            .uri("/api/upload/image")
            .insert_header(bearer())
            .insert_header(content_type)
            .set_payload(body)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json = json_body(res).await;
        assert!(json["message"].as_str().unwrap().starts_with("unsupported type"));
        assert!(files_in(temp.path()).is_empty());
    }

    #[actix_web::test]
    async fn oversized_part_is_rejected_while_streaming() {
        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);
        let (content_type, body) = multipart(&[png_part("file", "big.png", 5 * 1024 * 1024 + 1)]);

        let req = test::TestRequest::post()
            .uri("/api/upload/image")
            .insert_header(bearer())
            .insert_header(content_type)
            .set_payload(body)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json = json_body(res).await;
        assert_eq!(json["message"], "too large: more than 5242880 bytes");
        assert!(files_in(temp.path()).is_empty());
    }

    #[actix_web::test]
    async fn multiple_upload_stores_every_file() {
        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);
        let (content_type, body) = multipart(&[
            png_part("files", "a.png", 10),
            png_part("files", "b.png", 20),
            Part::Text { field: "folder", value: "activities" },
        ]);

        let req = test::TestRequest::post()
            .uri("/api/upload/images")
            .insert_header(bearer())
            .insert_header(content_type)
            .set_payload(body)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let json = json_body(res).await;
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["originalName"], "a.png");
        assert_eq!(data[1]["size"], 20);
        assert_ne!(data[0]["filename"], data[1]["filename"]);
        assert_eq!(files_in(&temp.path().join("uploads/activities")).len(), 2);
    }

    #[actix_web::test]
    async fn more_than_ten_files_is_rejected() {
        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);
        let names: Vec<String> = (0..11).map(|i| format!("{i}.png")).collect();
        let parts: Vec<Part<'_>> = names.iter().map(|n| png_part("files", n, 4)).collect();
        let (content_type, body) = multipart(&parts);

        let req = test::TestRequest::post()
            .uri("/api/upload/images")
            .insert_header(bearer())
            .insert_header(content_type)
            .set_payload(body)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(files_in(temp.path()).is_empty());
    }

    #[actix_web::test]
    async fn unexpected_file_field_is_rejected() {
        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);
        let (content_type, body) = multipart(&[png_part("avatar", "a.png", 4)]);

        let req = test::TestRequest::post()
            .uri("/api/upload/image")
            .insert_header(bearer())
            .insert_header(content_type)
            .set_payload(body)
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn base64_upload_and_delete() {
        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);

        let req = test::TestRequest::post()
            .uri("/api/upload/base64")
            .insert_header(bearer())
            .set_json(json!({ "base64": "data:image/png;base64,aGVsbG8=" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let json = json_body(res).await;
        let url = json["data"]["url"].as_str().unwrap().to_string();
        assert!(url.starts_with("/uploads/images/"));
        assert_eq!(json["data"]["mimeType"], "image/png");

        for expected in [true, false] {
            let req = test::TestRequest::delete()
                .uri("/api/upload")
                .insert_header(bearer())
                .set_json(json!({ "url": url }))
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::OK);
            assert_eq!(json_body(res).await["data"], expected);
        }
    }

    #[actix_web::test]
    async fn base64_body_larger_than_default_json_limit_is_accepted() {
        use base64::Engine;

        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);
        let payload = base64::engine::general_purpose::STANDARD.encode(vec![1u8; 4 * 1024 * 1024]);

        let req = test::TestRequest::post()
            .uri("/api/upload/base64")
            .insert_header(bearer())
            .set_json(json!({ "base64": format!("data:image/webp;base64,{}", payload) }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(json_body(res).await["data"]["size"], 4 * 1024 * 1024);
    }

    #[actix_web::test]
    async fn json_body_over_limit_is_too_large() {
        use base64::Engine;

        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp, 1024);
        let payload = base64::engine::general_purpose::STANDARD.encode(vec![1u8; 60_000]);

        let req = test::TestRequest::post()
            .uri("/api/upload/base64")
            .insert_header(bearer())
            .set_json(json!({ "base64": format!("data:image/png;base64,{}", payload) }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["message"], "too large: more than 1024 bytes");
        assert!(files_in(temp.path()).is_empty());
    }

    #[actix_web::test]
    async fn long_base64_folder_gets_invalid_folder_reason() {
        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);
        let folder = "f".repeat(65);

        let req = test::TestRequest::post()
            .uri("/api/upload/base64")
            .insert_header(bearer())
            .set_json(json!({ "base64": "data:image/png;base64,aGVsbG8=", "folder": folder }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json = json_body(res).await;
        assert_eq!(json["message"], format!("invalid folder: '{}'", folder));
        assert!(files_in(temp.path()).is_empty());
    }

    #[actix_web::test]
    async fn malformed_base64_is_a_format_error() {
        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);

        let req = test::TestRequest::post()
            .uri("/api/upload/base64")
            .insert_header(bearer())
            .set_json(json!({ "base64": "aGVsbG8=", "folder": "plots" }))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json = json_body(res).await;
        assert!(json["message"].as_str().unwrap().starts_with("invalid format"));
        assert!(files_in(temp.path()).is_empty());
    }

    #[actix_web::test]
    async fn stored_file_is_served_publicly() {
        let temp = TempDir::new().unwrap();
        let app = test_app!(&temp);
        let (content_type, body) = multipart(&[png_part("file", "cat.png", 16)]);

        let req = test::TestRequest::post()
            .uri("/api/upload/image")
            .insert_header(bearer())
            .insert_header(content_type)
            .set_payload(body)
            .to_request();
        let json = json_body(test::call_service(&app, req).await).await;
        let url = json["data"]["url"].as_str().unwrap().to_string();

        let res = test::call_service(&app, test::TestRequest::get().uri(&url).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
        assert_eq!(to_bytes(res.into_body()).await.unwrap().len(), 16);

        let missing = test::TestRequest::get().uri("/uploads/images/nope.png").to_request();
        assert_eq!(test::call_service(&app, missing).await.status(), StatusCode::NOT_FOUND);
    }
}
