mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use brightpath::models::{LocalFile, User};
use brightpath::services::CourseCatalog;
use brightpath::state::AppState;
use brightpath::storage::MemoryStorage;
use brightpath::views::add_course::CourseField;
use brightpath::views::my_courses::MyCoursesState;
use brightpath::views::profile::ProfileField;
use brightpath::views::{AddCourseForm, CourseDetailView, MyCoursesView, NoticeKind, ProfileEditor};

use common::{FailingSaver, FakeBackend, app_state, course, signed_in_storage};

fn nimal() -> User {
    User::new("42", "nimal", "nimal@example.com")
}

#[tokio::test]
async fn course_detail_renders_price_and_date_tokens() {
    let backend = FakeBackend::new();
    let state = app_state(backend, Arc::new(MemoryStorage::new())).await;
    let catalog = CourseCatalog::Loaded(vec![course("1", "Intro", 0.0), course("2", "Full-Stack", 1500.0)]);

    let free = CourseDetailView::new("1").render(&state, &catalog).await;
    let paid = CourseDetailView::new("2").render(&state, &catalog).await;

    assert!(free.contains("[Free]  SEP 5"));
    assert!(paid.contains("[LKR 1500]  SEP 5"));
    assert!(paid.contains("[Enroll Now]"));
}

#[tokio::test]
async fn course_detail_reports_catalog_states() {
    let state = app_state(FakeBackend::new(), Arc::new(MemoryStorage::new())).await;
    let view = CourseDetailView::new("5");

    assert_eq!(view.render(&state, &CourseCatalog::Loading).await, "Loading course details...");
    assert_eq!(
        view.render(&state, &CourseCatalog::Failed("offline".to_string())).await,
        "Error loading course: offline"
    );
    assert_eq!(view.render(&state, &CourseCatalog::Loaded(Vec::new())).await, "Course not found.");
}

#[tokio::test]
async fn enrolling_while_signed_out_is_refused_before_any_call() {
    let backend = FakeBackend::new();
    let state = app_state(backend.clone(), Arc::new(MemoryStorage::new())).await;
    let mut view = CourseDetailView::new("7");

    view.enroll(&state).await;

    let notice = view.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.message, "Please login to enroll in courses");
    assert_eq!(backend.enroll_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn enrolling_updates_the_detail_page() {
    let backend = FakeBackend::with_catalog(vec![course("7", "Rust", 1500.0)]);
    let state = app_state(backend.clone(), signed_in_storage(&nimal()).await).await;
    let catalog = CourseCatalog::load(state.backend.as_ref()).await;
    let mut view = CourseDetailView::new("7");

    view.enroll(&state).await;

    assert_eq!(view.notice().unwrap().message, "Successfully enrolled in the course!");
    assert!(!view.is_enrolling());
    assert!(view.render(&state, &catalog).await.contains("[Enrolled]"));
}

#[tokio::test]
async fn enrolling_an_enrolled_course_makes_no_call() {
    let backend = FakeBackend::new();
    backend.set_user_courses("42", vec![course("7", "Rust", 0.0)]);
    let state = app_state(backend.clone(), signed_in_storage(&nimal()).await).await;
    let mut view = CourseDetailView::new("7");

    view.enroll(&state).await;

    let notice = view.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Info);
    assert_eq!(notice.message, "You are already enrolled in this course");
    assert_eq!(backend.enroll_calls.load(Ordering::SeqCst), 0);
    assert_eq!(state.enrollments.enrolled_course_ids().await, vec!["7"]);
}

#[tokio::test]
async fn rejected_enrollment_shows_the_failure() {
    let backend = FakeBackend::new();
    backend.fail_enroll.store(true, Ordering::SeqCst);
    let state = app_state(backend, signed_in_storage(&nimal()).await).await;
    let mut view = CourseDetailView::new("7");

    view.enroll(&state).await;

    assert_eq!(view.notice().unwrap().message, "Enrollment failed: Failed to enroll");
    assert!(!state.enrollments.is_enrolled("7").await);
}

#[tokio::test]
async fn download_saves_the_file_and_releases_the_url() {
    let backend = FakeBackend::with_catalog(vec![course("7", "Rust Basics", 0.0)]);
    *backend.resource.lock().unwrap() = b"%PDF-1.7".to_vec();
    let state = app_state(backend.clone(), signed_in_storage(&nimal()).await).await;
    let catalog = CourseCatalog::load(state.backend.as_ref()).await;
    let mut view = CourseDetailView::new("7");

    let path = view.download(&state, &catalog).await.expect("saved");

    assert!(path.ends_with("Rust Basics.pdf"));
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.7");
    assert_eq!(state.blobs.live_count(), 0);
    assert_eq!(
        backend.tokens.lock().unwrap().last().cloned().flatten().as_deref(),
        Some("tok-42")
    );
}

#[tokio::test]
async fn failed_download_reports_and_leaks_nothing() {
    let backend = FakeBackend::with_catalog(vec![course("7", "Rust", 0.0)]);
    backend.fail_download.store(true, Ordering::SeqCst);
    let state = app_state(backend, Arc::new(MemoryStorage::new())).await;
    let catalog = CourseCatalog::load(state.backend.as_ref()).await;
    let mut view = CourseDetailView::new("7");

    assert!(view.download(&state, &catalog).await.is_none());

    assert_eq!(view.notice().unwrap().message, "Failed to download resource");
    assert_eq!(state.blobs.live_count(), 0);
}

#[tokio::test]
async fn failed_save_still_releases_the_url() {
    let backend = FakeBackend::with_catalog(vec![course("7", "Rust", 0.0)]);
    *backend.resource.lock().unwrap() = vec![1, 2, 3];
    let state = AppState::new(backend, Arc::new(MemoryStorage::new()), Arc::new(FailingSaver)).await;
    let catalog = CourseCatalog::load(state.backend.as_ref()).await;
    let mut view = CourseDetailView::new("7");

    assert!(view.download(&state, &catalog).await.is_none());

    assert_eq!(view.notice().unwrap().kind, NoticeKind::Error);
    assert_eq!(state.blobs.live_count(), 0);
}

#[tokio::test]
async fn photo_upload_swaps_in_a_cache_busted_url() {
    let backend = FakeBackend::new();
    *backend.image_url.lock().unwrap() = Some("https://cdn.example.com/users/42.png".to_string());
    let state = app_state(backend, signed_in_storage(&nimal()).await).await;
    let mut editor = ProfileEditor::new(&state).await;

    editor
        .change_photo(&state, LocalFile::new("me.png", vec![0x89, 0x50]))
        .await;

    let image = state.session.current_user().await.unwrap().profile_image.unwrap();
    assert!(image.starts_with("https://cdn.example.com/users/42.png?t="));
    assert!(editor.preview_url().is_none());
    assert!(!editor.is_uploading());
    assert_eq!(state.blobs.live_count(), 0);
    assert_eq!(editor.display_url(&state).await, Some(image));
}

#[tokio::test]
async fn failed_photo_upload_keeps_the_preview_until_teardown() {
    let backend = FakeBackend::new();
    backend.fail_upload.store(true, Ordering::SeqCst);
    let state = app_state(backend, signed_in_storage(&nimal()).await).await;
    let mut editor = ProfileEditor::new(&state).await;

    editor.change_photo(&state, LocalFile::new("me.png", vec![1])).await;

    assert_eq!(editor.notice().unwrap().message, "Failed to upload profile image.");
    let preview = editor.preview_url().expect("preview kept").to_string();
    assert!(preview.starts_with("blob:"));
    assert_eq!(editor.display_url(&state).await, Some(preview));
    assert_eq!(state.blobs.live_count(), 1);

    drop(editor);
    assert_eq!(state.blobs.live_count(), 0);
}

#[tokio::test]
async fn replacing_a_preview_releases_the_old_one() {
    let backend = FakeBackend::new();
    backend.fail_upload.store(true, Ordering::SeqCst);
    let state = app_state(backend, signed_in_storage(&nimal()).await).await;
    let mut editor = ProfileEditor::new(&state).await;

    editor.change_photo(&state, LocalFile::new("a.png", vec![1])).await;
    editor.change_photo(&state, LocalFile::new("b.png", vec![2])).await;

    assert_eq!(state.blobs.live_count(), 1);
}

#[tokio::test]
async fn saving_the_profile_persists_changed_fields() {
    let backend = FakeBackend::new();
    let state = app_state(backend.clone(), signed_in_storage(&nimal()).await).await;
    let mut editor = ProfileEditor::new(&state).await;

    editor.start_editing();
    editor.set_field(ProfileField::Email, "nimal@brightpath.lk");
    editor.set_field(ProfileField::Password, "hunter22");
    editor.save(&state).await;

    assert!(!editor.is_editing());
    assert!(editor.form().password.is_empty());
    let updates = backend.user_updates.lock().unwrap().clone();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].1.username, None);
    assert_eq!(updates[0].1.email.as_deref(), Some("nimal@brightpath.lk"));
    assert_eq!(updates[0].1.password.as_deref(), Some("hunter22"));
    assert_eq!(state.session.current_user().await.unwrap().email, "nimal@brightpath.lk");
}

#[tokio::test]
async fn failed_profile_save_stays_in_edit_mode() {
    let backend = FakeBackend::new();
    backend.fail_update_user.store(true, Ordering::SeqCst);
    let state = app_state(backend, signed_in_storage(&nimal()).await).await;
    let mut editor = ProfileEditor::new(&state).await;

    editor.start_editing();
    editor.set_field(ProfileField::Username, "renamed");
    editor.save(&state).await;

    assert!(editor.is_editing());
    assert_eq!(editor.notice().unwrap().kind, NoticeKind::Error);
    assert_eq!(state.session.current_user().await.unwrap().username, "nimal");
}

#[tokio::test]
async fn cancel_restores_the_form() {
    let state = app_state(FakeBackend::new(), signed_in_storage(&nimal()).await).await;
    let mut editor = ProfileEditor::new(&state).await;

    editor.start_editing();
    editor.set_field(ProfileField::Username, "typo");
    editor.cancel(&state).await;

    assert!(!editor.is_editing());
    assert_eq!(editor.form().username, "nimal");
    assert!(editor.render(&state).await.contains("Username: nimal"));
}

#[tokio::test]
async fn my_courses_shows_empty_state() {
    let state = app_state(FakeBackend::new(), signed_in_storage(&nimal()).await).await;
    let mut view = MyCoursesView::new();

    view.on_user_transition(&state).await;

    assert_eq!(view.state(), &MyCoursesState::Loaded(Vec::new()));
    let rendered = view.render();
    assert!(rendered.contains("You haven't enrolled in any courses yet"));
    assert!(rendered.contains("/courses"));
}

#[tokio::test]
async fn my_courses_lists_enrolled_courses() {
    let backend = FakeBackend::new();
    backend.set_user_courses("42", vec![course("7", "Rust", 0.0)]);
    let state = app_state(backend, signed_in_storage(&nimal()).await).await;
    let mut view = MyCoursesView::new();

    view.on_user_transition(&state).await;

    let rendered = view.render();
    assert!(rendered.contains("Rust [Enrolled]"));
    assert!(rendered.contains("/course/7"));
}

#[tokio::test]
async fn my_courses_shows_fetch_errors() {
    let backend = FakeBackend::new();
    let state = app_state(backend.clone(), signed_in_storage(&nimal()).await).await;
    backend.fail_fetch.store(true, Ordering::SeqCst);
    let mut view = MyCoursesView::new();

    view.on_user_transition(&state).await;

    assert_eq!(view.render(), "My Enrolled Courses\nError loading courses: Failed to fetch courses: 500");
}

#[tokio::test]
async fn my_courses_waits_for_a_user() {
    let backend = FakeBackend::new();
    let state = app_state(backend.clone(), Arc::new(MemoryStorage::new())).await;
    let mut view = MyCoursesView::new();

    view.on_user_transition(&state).await;

    assert_eq!(view.state(), &MyCoursesState::Loading);
    assert_eq!(backend.fetches(), 0);
}

fn filled_form() -> AddCourseForm {
    let mut form = AddCourseForm::new();
    form.set_field(CourseField::Name, "Rust for Students");
    form.set_field(CourseField::Description, "Ownership, borrowing and async");
    form.set_field(CourseField::StartDate, "2025-09-05");
    form.set_field(CourseField::Price, "1500");
    form
}

#[tokio::test]
async fn add_course_with_required_fields_only_submits_and_resets() {
    let backend = FakeBackend::new();
    let state = app_state(backend.clone(), signed_in_storage(&nimal()).await).await;
    let mut form = filled_form();

    assert!(form.submit(&state).await);

    let created = backend.created.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "Rust for Students");
    assert!(created[0].image.is_none() && created[0].resource.is_none());
    assert_eq!(form.success_message(), Some("Course added successfully!"));
    assert!(form.fields().name.is_empty());
    assert!(form.fields().price.is_empty());
}

#[tokio::test]
async fn add_course_resets_file_inputs_after_success() {
    let backend = FakeBackend::new();
    let state = app_state(backend.clone(), signed_in_storage(&nimal()).await).await;
    let mut form = filled_form();
    form.set_image(Some(LocalFile::new("cover.jpg", vec![1])));
    form.set_resource(Some(LocalFile::new("syllabus.pdf", vec![2])));

    assert!(form.submit(&state).await);

    let created = backend.created.lock().unwrap().clone();
    assert_eq!(created[0].resource.as_ref().unwrap().content_type, "application/pdf");
    assert!(form.fields().image.is_none());
    assert!(form.fields().resource.is_none());
}

#[tokio::test]
async fn add_course_surfaces_the_server_message() {
    let backend = FakeBackend::new();
    *backend.create_error.lock().unwrap() = Some("Failed to upload image: too large".to_string());
    let state = app_state(backend, signed_in_storage(&nimal()).await).await;
    let mut form = filled_form();

    assert!(!form.submit(&state).await);

    assert_eq!(form.error_message(), Some("Failed to upload image: too large"));
    assert_eq!(form.fields().name, "Rust for Students");
}

#[tokio::test]
async fn add_course_checks_required_fields_locally() {
    let backend = FakeBackend::new();
    let state = app_state(backend.clone(), signed_in_storage(&nimal()).await).await;
    let mut form = filled_form();
    form.set_field(CourseField::Price, "-5");

    assert!(!form.submit(&state).await);

    assert!(form.error_message().unwrap().contains("Price"));
    assert!(backend.created.lock().unwrap().is_empty());
}
