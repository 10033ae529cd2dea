//! Request routing: one typed envelope in, one typed envelope out.

use oriel_build::BuildService;
use oriel_error::ServiceError;
use oriel_proto::{
    BuildRequest, BuildResponse, CommandRequest, DirEntry, EntryKind, FileRequest, FileResponse,
    Request, Response,
};
use oriel_vfs::{FileService, ShellService};

/// The service set shared by all sessions.
///
/// Holds no per-session state — every message is fully self-describing, so
/// concurrent sessions never observe each other's in-flight requests.
pub struct Services {
    /// Confined file operations over the documents root.
    pub files: FileService,
    /// Shell verbs over the workspace root.
    pub shell: ShellService,
    /// Compile/run pipelines over both roots.
    pub build: BuildService,
}

/// Route a validated request to its handler and normalize failures into an
/// error envelope. Never panics, never closes the session.
pub async fn dispatch(services: &Services, request: Request) -> Response {
    match request {
        Request::File(req) => handle_file(services, req)
            .await
            .unwrap_or_else(error_response),
        Request::Command(cmd) => handle_command(services, cmd).await,
        Request::Build(req) => handle_build(services, req)
            .await
            .unwrap_or_else(error_response),
    }
}

async fn handle_file(
    services: &Services,
    request: FileRequest,
) -> Result<Response, ServiceError> {
    let response = match request {
        FileRequest::Read { path } => {
            let content = services.files.read(&path).await?;
            FileResponse::Read { path, content }
        }
        FileRequest::Write { path, content } => {
            services.files.write(&path, &content).await?;
            FileResponse::Write {
                path,
                success: true,
            }
        }
        FileRequest::Create { path, content } => {
            services.files.create(&path, &content).await?;
            FileResponse::Create {
                path,
                success: true,
            }
        }
        FileRequest::Delete { path } => {
            services.files.delete(&path).await?;
            FileResponse::Delete {
                path,
                success: true,
            }
        }
        FileRequest::List { path } => {
            let entries = services.files.list(path.as_deref()).await?;
            let items = entries
                .into_iter()
                .map(|entry| DirEntry {
                    name: entry.name,
                    kind: match entry.kind {
                        oriel_vfs::EntryKind::File => EntryKind::File,
                        oriel_vfs::EntryKind::Directory => EntryKind::Directory,
                    },
                })
                .collect();
            let display_path = match path.as_deref() {
                None | Some("") | Some(".") => ".".to_string(),
                Some(p) => p.to_string(),
            };
            FileResponse::List {
                path: display_path,
                items,
            }
        }
    };
    Ok(Response::File(response))
}

async fn handle_command(services: &Services, command: CommandRequest) -> Response {
    let output = services
        .shell
        .handle(&command.action, command.path.as_deref())
        .await;
    Response::Output { output }
}

async fn handle_build(
    services: &Services,
    request: BuildRequest,
) -> Result<Response, ServiceError> {
    let response = match request {
        BuildRequest::Compile { file } => {
            let result = services.build.compile(&file).await?;
            BuildResponse::Compile {
                success: result.success,
                output: result.output,
                executable: result.artifact,
            }
        }
        BuildRequest::Run { file } => {
            let result = services.build.run(&file).await?;
            BuildResponse::Run {
                success: result.success,
                output: result.stdout,
                error: result.stderr,
                exit_code: result.exit_code,
            }
        }
    };
    Ok(Response::Build(response))
}

fn error_response(err: ServiceError) -> Response {
    tracing::debug!(code = err.code(), error = %err, "request failed");
    Response::Error {
        message: err.to_string(),
    }
}
