use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use brightpath::api::{BackendClient, HttpBackendClient};
use brightpath::blob::DirectorySaver;
use brightpath::config::{self, ClientConfig};
use brightpath::error::AppError;
use brightpath::models::LocalFile;
use brightpath::services::CourseCatalog;
use brightpath::state::AppState;
use brightpath::storage::SqliteStorage;
use brightpath::views::add_course::CourseField;
use brightpath::views::profile::ProfileField;
use brightpath::views::{AddCourseForm, CourseDetailView, MyCoursesView, Notice, NoticeKind, ProfileEditor};

#[derive(Parser)]
#[command(name = "brightpath")]
#[command(author, version, about = "Browse courses, enroll and manage your profile")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "BRIGHTPATH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the signed-in user and token
    Logout,
    /// Show the signed-in user's profile
    Whoami,
    /// List the course catalog
    Courses,
    /// Show one course
    Course { id: String },
    /// Enroll the signed-in user in a course
    Enroll { id: String },
    /// Drop an enrollment
    Unenroll { id: String },
    /// Download a course's resource file
    Download {
        id: String,
        /// Directory to save into (default: BRIGHTPATH_DOWNLOAD_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the courses you are enrolled in
    MyCourses,
    /// Edit your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Publish a new course
    AddCourse {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        /// YYYY-MM-DD
        #[arg(long)]
        start_date: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        image: Option<PathBuf>,
        /// PDF resource offered for download
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Change username, email or password
    Update {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Upload a new profile photo
    Photo { path: PathBuf },
}

#[tokio::main]
async fn main() {
    let log_filter = config::load_env(None);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("command failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Runs one command and prints the resulting view. `Ok(false)` means the
/// view ended in an error notice.
async fn run(cli: Cli) -> Result<bool, AppError> {
    let config = ClientConfig::new_from_env()?;
    let storage = Arc::new(SqliteStorage::connect(&config.storage_url).await?);
    let backend: Arc<dyn BackendClient> = Arc::new(HttpBackendClient::new(&config)?);

    let out_dir = match &cli.command {
        Commands::Download { out: Some(dir), .. } => dir.clone(),
        _ => config.download_dir.clone(),
    };
    let state = AppState::new(backend, storage, Arc::new(DirectorySaver::new(out_dir))).await;

    match cli.command {
        Commands::Login { username, password } => {
            let (user, token) = state.backend.login(&username, &password).await?;
            state.login(user, token.as_deref()).await?;
            let profile = ProfileEditor::new(&state).await;
            let rendered = profile.render(&state).await;
            println!("{}", rendered);
            Ok(true)
        }
        Commands::Logout => {
            state.logout().await?;
            println!("Signed out.");
            Ok(true)
        }
        Commands::Whoami => {
            let profile = ProfileEditor::new(&state).await;
            let rendered = profile.render(&state).await;
            println!("{}", rendered);
            Ok(true)
        }
        Commands::Courses => {
            let catalog = CourseCatalog::load(state.backend.as_ref()).await;
            if let CourseCatalog::Failed(e) = &catalog {
                println!("Error loading courses: {}", e);
                return Ok(false);
            }
            for course in catalog.courses() {
                let marker = if state.enrollments.is_enrolled(&course.id).await { "*" } else { " " };
                println!(
                    "{} {:>6}  {}  ({})",
                    marker,
                    course.id,
                    course.display_name(),
                    brightpath::views::format_price(course.price)
                );
            }
            Ok(true)
        }
        Commands::Course { id } => {
            let catalog = CourseCatalog::load(state.backend.as_ref()).await;
            let rendered = CourseDetailView::new(id).render(&state, &catalog).await;
            println!("{}", rendered);
            Ok(!matches!(catalog, CourseCatalog::Failed(_)))
        }
        Commands::Enroll { id } => {
            let mut view = CourseDetailView::new(id);
            view.enroll(&state).await;
            Ok(report(view.notice()))
        }
        Commands::Unenroll { id } => {
            let user_id = state.session.user_id().await.ok_or(AppError::NotSignedIn)?;
            state.enrollments.unenroll_from_course(&user_id, &id).await?;
            println!("Unenrolled from course {}.", id);
            Ok(true)
        }
        Commands::Download { id, .. } => {
            let catalog = CourseCatalog::load(state.backend.as_ref()).await;
            let mut view = CourseDetailView::new(id);
            view.download(&state, &catalog).await;
            Ok(report(view.notice()))
        }
        Commands::MyCourses => {
            let mut view = MyCoursesView::new();
            view.on_user_transition(&state).await;
            if state.session.user_id().await.is_none() {
                println!("Please login to see your courses");
                return Ok(false);
            }
            println!("{}", view.render());
            Ok(true)
        }
        Commands::Profile { action } => {
            let mut editor = ProfileEditor::new(&state).await;
            match action {
                ProfileAction::Update { username, email, password } => {
                    editor.start_editing();
                    if let Some(username) = username {
                        editor.set_field(ProfileField::Username, username);
                    }
                    if let Some(email) = email {
                        editor.set_field(ProfileField::Email, email);
                    }
                    if let Some(password) = password {
                        editor.set_field(ProfileField::Password, password);
                    }
                    editor.save(&state).await;
                }
                ProfileAction::Photo { path } => {
                    let file = LocalFile::read(&path).await?;
                    editor.change_photo(&state, file).await;
                }
            }
            let ok = report(editor.notice());
            let rendered = editor.render(&state).await;
            println!("{}", rendered);
            Ok(ok)
        }
        Commands::AddCourse {
            name,
            description,
            start_date,
            price,
            image,
            file,
        } => {
            let mut form = AddCourseForm::new();
            form.set_field(CourseField::Name, name);
            form.set_field(CourseField::Description, description);
            form.set_field(CourseField::StartDate, start_date);
            form.set_field(CourseField::Price, price);
            if let Some(path) = image {
                form.set_image(Some(LocalFile::read(&path).await?));
            }
            if let Some(path) = file {
                form.set_resource(Some(LocalFile::read(&path).await?));
            }
            let ok = form.submit(&state).await;
            println!("{}", form.render());
            Ok(ok)
        }
    }
}

fn report(notice: Option<&Notice>) -> bool {
    match notice {
        Some(notice) => {
            println!("{}", notice);
            notice.kind != NoticeKind::Error
        }
        None => true,
    }
}
