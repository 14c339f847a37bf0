use formnote_core::db::open_db_in_memory;
use formnote_core::{
    GridService, GridServiceError, RepoError, SqliteGridRepository, SqliteNotebookRepository,
    SqliteTemplateRepository, Template, TemplateFilter, TemplateRepository,
    TemplateValidationError, EMPTY_DISPLAY,
};
use rusqlite::Connection;

fn service(conn: &Connection) -> GridService<SqliteNotebookRepository<'_>, SqliteGridRepository<'_>> {
    GridService::new(
        SqliteNotebookRepository::new(conn),
        SqliteGridRepository::new(conn),
    )
}

fn names(templates: &[Template]) -> Vec<&str> {
    templates.iter().map(|template| template.name.as_str()).collect()
}

#[test]
fn system_templates_are_listed_first_in_seed_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTemplateRepository::new(&conn);

    let user_id = repo
        .create_template(&Template::new("Cleaning rota", "weekly chores", 7, 3))
        .unwrap();

    let all = repo.list_templates(TemplateFilter::All, None).unwrap();
    assert_eq!(all.len(), 7);
    assert_eq!(
        names(&all[..3]),
        vec!["空白表格", "日程安排", "收支记录"]
    );
    assert_eq!(all[6].id, user_id);
    assert!(!all[6].is_system);

    let user = repo.list_templates(TemplateFilter::User, None).unwrap();
    assert_eq!(names(&user), vec!["Cleaning rota"]);
    let system = repo.list_templates(TemplateFilter::System, None).unwrap();
    assert!(system.iter().all(|template| template.is_system));
    assert_eq!(system.len(), 6);
}

#[test]
fn search_matches_name_or_description_ignoring_case() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTemplateRepository::new(&conn);
    repo.create_template(&Template::new("Linen stock", "Towels and SHEETS", 10, 4))
        .unwrap();

    let found = repo
        .list_templates(TemplateFilter::All, Some("sheets"))
        .unwrap();
    assert_eq!(names(&found), vec!["Linen stock"]);

    let found = repo
        .list_templates(TemplateFilter::System, Some("民宿"))
        .unwrap();
    assert_eq!(names(&found), vec!["房间清单"]);

    let found = repo
        .list_templates(TemplateFilter::User, Some("民宿"))
        .unwrap();
    assert!(found.is_empty());
}

#[test]
fn create_template_validates_and_rejects_duplicate_names() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTemplateRepository::new(&conn);

    let err = repo
        .create_template(&Template::new("  ", "", 5, 5))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Template(TemplateValidationError::EmptyName)
    ));

    let err = repo
        .create_template(&Template::new("Grid", "", 5, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Template(TemplateValidationError::EmptyGrid { .. })
    ));

    let err = repo
        .create_template(&Template::new("联系人", "", 5, 5))
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateTemplateName(name) if name == "联系人"));

    let id = repo
        .create_template(&Template::new(" Stock ", "  spare parts ", 5, 2))
        .unwrap();
    let stored = repo.get_template(id).unwrap().expect("template stored");
    assert_eq!(stored.name, "Stock");
    assert_eq!(stored.description, "spare parts");
}

#[test]
fn only_user_templates_can_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTemplateRepository::new(&conn);

    let system_id = repo.list_templates(TemplateFilter::System, None).unwrap()[0].id;
    assert!(matches!(
        repo.delete_template(system_id),
        Err(RepoError::ReadOnlyTemplate(id)) if id == system_id
    ));

    let id = repo
        .create_template(&Template::new("Drafts", "", 3, 3))
        .unwrap();
    repo.delete_template(id).unwrap();
    assert!(repo.get_template(id).unwrap().is_none());
    assert!(matches!(
        repo.delete_template(id),
        Err(RepoError::TemplateNotFound(missing)) if missing == id
    ));
}

#[test]
fn notebook_from_room_template_gets_headers_and_blank_grid() {
    let conn = open_db_in_memory().unwrap();
    let templates = SqliteTemplateRepository::new(&conn);
    let rooms = templates
        .list_templates(TemplateFilter::System, Some("房间清单"))
        .unwrap()
        .remove(0);

    let service = service(&conn);
    let id = service.create_notebook_from_template("Summer", &rooms).unwrap();

    let columns = service.columns(id).unwrap();
    assert_eq!(
        columns.iter().map(|column| column.name.as_str()).collect::<Vec<_>>(),
        vec!["房间号", "房型", "状态", "客人", "备注"]
    );
    assert_eq!(service.cells(id).unwrap().len(), 20 * 5);

    let options = service.filter_options(id, 0).unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].display(), EMPTY_DISPLAY);
    assert_eq!(options[0].count, 20);
}

#[test]
fn blank_template_names_columns_by_position() {
    let conn = open_db_in_memory().unwrap();
    let blank = SqliteTemplateRepository::new(&conn)
        .list_templates(TemplateFilter::System, None)
        .unwrap()
        .remove(0);
    assert!(blank.data.is_none());

    let service = service(&conn);
    let id = service.create_notebook_from_template("Scratch", &blank).unwrap();
    let names = service
        .columns(id)
        .unwrap()
        .into_iter()
        .map(|column| column.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["列1", "列2", "列3", "列4", "列5"]);
}

#[test]
fn invalid_template_creates_no_notebook() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .create_notebook_from_template("Broken", &Template::new("Empty", "", 0, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        GridServiceError::Repo(RepoError::Template(_))
    ));
    assert!(service.list_notebooks().unwrap().is_empty());
}

#[test]
fn notebook_saved_as_template_recreates_its_layout() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let id = service.create_notebook("Bookings", None).unwrap();
    service.add_column(id, "Guest").unwrap();
    service.add_column(id, "Nights").unwrap();
    service.set_cell(id, 3, 1, "2").unwrap();

    let template = service
        .template_from_notebook(id, "Bookings layout", "from a live notebook")
        .unwrap();
    assert_eq!((template.rows, template.cols), (4, 2));

    let repo = SqliteTemplateRepository::new(&conn);
    let template_id = repo.create_template(&template).unwrap();
    let stored = repo.get_template(template_id).unwrap().expect("template stored");

    let copy = service.create_notebook_from_template("Bookings 2", &stored).unwrap();
    let names = service
        .columns(copy)
        .unwrap()
        .into_iter()
        .map(|column| column.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Guest", "Nights"]);
    assert!(service
        .cells(copy)
        .unwrap()
        .iter()
        .all(|cell| cell.content.is_empty()));
    assert_eq!(service.cells(copy).unwrap().len(), 8);
}
