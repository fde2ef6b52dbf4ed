use agro_domain::{Crop, CropFilter, CropInput, CropRepository, CropStatus, CrudRepository, DomainError, FieldActivity,
                  FieldActivityInput, FieldDocument, FieldDocumentInput, FieldTreatment, FieldTreatmentInput,
                  Irrigation, IrrigationInput, JournalFilter, NewUserRecord, Production, ProductionInput,
                  RecordFilter, Role, SoilAnalysis, SoilAnalysisInput, UserChanges, UserRepository};
use agro_persistence::DieselRepository;
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::Connection;
use std::path::PathBuf;
use uuid::Uuid;

struct TempDb {
  path: PathBuf,
  repo: DieselRepository,
}

impl TempDb {
  fn new() -> Self {
    let path = std::env::temp_dir().join(format!("agro_test_{}.db", Uuid::new_v4()));
    let repo = DieselRepository::new(path.to_str().unwrap()).expect("repo");
    TempDb { path, repo }
  }
}

impl Drop for TempDb {
  fn drop(&mut self) {
    let _ = std::fs::remove_file(&self.path);
    let _ = std::fs::remove_file(self.path.with_extension("db-wal"));
    let _ = std::fs::remove_file(self.path.with_extension("db-shm"));
  }
}

fn day(d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
}

fn user(repo: &DieselRepository, email: &str, role: Role) -> i32 {
  repo.create_user(&NewUserRecord { name: "Test".into(),
                                    email: email.into(),
                                    password_hash: "$2b$04$hash".into(),
                                    role })
      .expect("create user")
      .id
}

fn crop(repo: &DieselRepository, user_id: i32, name: &str) -> Crop {
  CrudRepository::<Crop>::create(repo,
                                 &CropInput { user_id,
                                              name: name.into(),
                                              variety: None,
                                              plot: Some("P-1".into()),
                                              area_ha: 2.0,
                                              sowing_date: day(1),
                                              expected_harvest_date: None,
                                              status: CropStatus::Sembrado }).expect("create crop")
}

fn fill_crop(repo: &DieselRepository, crop_id: i32, n: usize) {
  for i in 0..n {
    CrudRepository::<Irrigation>::create(repo,
                                         &IrrigationInput { crop_id,
                                                            date: day(2 + i as u32),
                                                            water_m3: 10.0,
                                                            method: Some("goteo".into()),
                                                            duration_min: Some(30),
                                                            notes: None }).expect("irrigation");
    CrudRepository::<SoilAnalysis>::create(repo,
                                           &SoilAnalysisInput { crop_id,
                                                                date: day(2 + i as u32),
                                                                ph: 6.5,
                                                                organic_matter_pct: Some(2.0),
                                                                nitrogen_ppm: None,
                                                                phosphorus_ppm: None,
                                                                potassium_ppm: None,
                                                                notes: None }).expect("soil");
    CrudRepository::<Production>::create(repo,
                                         &ProductionInput { crop_id,
                                                            harvest_date: day(20 + i as u32),
                                                            quantity_kg: 100.0,
                                                            quality: None,
                                                            price_per_kg: Some(0.5),
                                                            notes: None }).expect("production");
  }
}

fn by_crop(crop_id: i32) -> RecordFilter {
  RecordFilter { crop_id: Some(crop_id), ..Default::default() }
}

#[test]
fn deleting_a_crop_removes_all_its_records() {
  if cfg!(feature = "pg") {
    eprintln!("skipping sqlite-only persistence test because 'pg' feature is enabled");
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let u = user(repo, "ana@finca.es", Role::Agricultor);
  let target = crop(repo, u, "Tomate");
  let other = crop(repo, u, "Pimiento");
  fill_crop(repo, target.id, 2);
  fill_crop(repo, other.id, 1);

  let summary = repo.delete_crop_cascade(target.id).expect("cascade");
  assert_eq!(summary.crops, 1);
  assert_eq!(summary.irrigations, 2);
  assert_eq!(summary.soil_analyses, 2);
  assert_eq!(summary.productions, 2);

  assert!(CrudRepository::<Crop>::get(repo, target.id).unwrap().is_none());
  assert!(CrudRepository::<Irrigation>::list(repo, &by_crop(target.id)).unwrap().is_empty());
  assert!(CrudRepository::<SoilAnalysis>::list(repo, &by_crop(target.id)).unwrap().is_empty());
  assert!(CrudRepository::<Production>::list(repo, &by_crop(target.id)).unwrap().is_empty());
  // El otro cultivo no se toca.
  assert_eq!(CrudRepository::<Irrigation>::list(repo, &by_crop(other.id)).unwrap().len(), 1);
  assert_eq!(CrudRepository::<Production>::list(repo, &by_crop(other.id)).unwrap().len(), 1);
}

#[test]
fn deleting_a_missing_crop_is_not_found_and_changes_nothing() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let u = user(repo, "luis@finca.es", Role::Agricultor);
  let c = crop(repo, u, "Maíz");
  fill_crop(repo, c.id, 1);

  match repo.delete_crop_cascade(c.id + 100) {
    Err(DomainError::NotFound(_)) => {}
    other => panic!("expected NotFound, got {:?}", other),
  }
  assert_eq!(CrudRepository::<Crop>::list(repo, &CropFilter::default()).unwrap().len(), 1);
  assert_eq!(CrudRepository::<Irrigation>::list(repo, &by_crop(c.id)).unwrap().len(), 1);
}

#[test]
fn failed_cascade_rolls_back_every_step() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let u = user(repo, "eva@finca.es", Role::Agricultor);
  let c = crop(repo, u, "Vid");
  fill_crop(repo, c.id, 2);

  // Un trigger hace fallar el último paso (borrar el cultivo) después de
  // que los hijos ya se hayan borrado dentro de la transacción.
  let mut raw = diesel::SqliteConnection::establish(db.path.to_str().unwrap()).expect("raw conn");
  raw.batch_execute("CREATE TRIGGER block_crop_delete BEFORE DELETE ON crops \
                     BEGIN SELECT RAISE(ABORT, 'bloqueado'); END;")
     .expect("trigger");

  let err = repo.delete_crop_cascade(c.id).expect_err("cascade must fail");
  assert!(matches!(err, DomainError::StorageError(_)), "got {:?}", err);

  assert!(CrudRepository::<Crop>::get(repo, c.id).unwrap().is_some());
  assert_eq!(CrudRepository::<Irrigation>::list(repo, &by_crop(c.id)).unwrap().len(), 2);
  assert_eq!(CrudRepository::<SoilAnalysis>::list(repo, &by_crop(c.id)).unwrap().len(), 2);
  assert_eq!(CrudRepository::<Production>::list(repo, &by_crop(c.id)).unwrap().len(), 2);
}

#[test]
fn records_filtered_by_user_only_see_own_crops() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let a = user(repo, "a@finca.es", Role::Agricultor);
  let b = user(repo, "b@finca.es", Role::Agricultor);
  let ca = crop(repo, a, "Trigo");
  let cb = crop(repo, b, "Cebada");
  fill_crop(repo, ca.id, 2);
  fill_crop(repo, cb.id, 3);

  let mine = CrudRepository::<Irrigation>::list(repo, &RecordFilter { user_id: Some(a), ..Default::default() }).unwrap();
  assert_eq!(mine.len(), 2);
  assert!(mine.iter().all(|i| i.crop_id == ca.id));
  assert_eq!(CrudRepository::<Irrigation>::owner_of(repo, mine[0].id).unwrap(), Some(a));

  let by_date = RecordFilter { user_id: Some(b), from: Some(day(3)), to: Some(day(3)), ..Default::default() };
  assert_eq!(CrudRepository::<SoilAnalysis>::list(repo, &by_date).unwrap().len(), 1);

  let removed = CrudRepository::<Production>::delete_where(repo, &by_crop(cb.id)).unwrap();
  assert_eq!(removed.productions, 3);
  assert_eq!(CrudRepository::<Production>::list(repo, &by_crop(ca.id)).unwrap().len(), 2);
}

#[test]
fn deleting_an_activity_unlinks_treatments_and_documents() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let u = user(repo, "rosa@finca.es", Role::Agricultor);
  let act = CrudRepository::<FieldActivity>::create(repo,
                                                    &FieldActivityInput { user_id: u,
                                                                          date: day(4),
                                                                          activity_type: "Fumigación".into(),
                                                                          description: None,
                                                                          plot: None }).unwrap();
  let tr = CrudRepository::<FieldTreatment>::create(repo,
                                                    &FieldTreatmentInput { user_id: u,
                                                                           activity_id: Some(act.id),
                                                                           date: day(4),
                                                                           product: "Cobre".into(),
                                                                           active_ingredient: None,
                                                                           dose: 2.0,
                                                                           dose_unit: "kg/ha".into(),
                                                                           target_pest: None,
                                                                           safety_period_days: Some(15),
                                                                           plot: None }).unwrap();
  let doc = CrudRepository::<FieldDocument>::create(repo,
                                                    &FieldDocumentInput { user_id: u,
                                                                          activity_id: Some(act.id),
                                                                          treatment_id: Some(tr.id),
                                                                          title: "Receta".into(),
                                                                          doc_type: Some("receta".into()),
                                                                          file_path: Some("uploads/x.pdf".into()),
                                                                          sha256: Some("abc".into()) }).unwrap();

  let summary = CrudRepository::<FieldActivity>::delete(repo, act.id).unwrap();
  assert_eq!(summary.activities, 1);

  let tr = CrudRepository::<FieldTreatment>::get(repo, tr.id).unwrap().expect("treatment survives");
  assert_eq!(tr.activity_id, None);
  let d = CrudRepository::<FieldDocument>::get(repo, doc.id).unwrap().expect("document survives");
  assert_eq!(d.activity_id, None);
  assert_eq!(d.treatment_id, Some(tr.id));

  let summary = CrudRepository::<FieldDocument>::delete(repo, doc.id).unwrap();
  assert_eq!(summary.documents, 1);
  assert_eq!(summary.released_files, vec!["uploads/x.pdf".to_string()]);
}

#[test]
fn journal_links_must_belong_to_the_same_user() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let a = user(repo, "pablo@finca.es", Role::Agricultor);
  let b = user(repo, "marta@finca.es", Role::Agricultor);
  let act = CrudRepository::<FieldActivity>::create(repo,
                                                    &FieldActivityInput { user_id: a,
                                                                          date: day(5),
                                                                          activity_type: "Poda".into(),
                                                                          description: None,
                                                                          plot: None }).unwrap();
  let foreign = FieldDocumentInput { user_id: b,
                                     activity_id: Some(act.id),
                                     treatment_id: None,
                                     title: "Ajeno".into(),
                                     doc_type: None,
                                     file_path: None,
                                     sha256: None };
  assert!(matches!(CrudRepository::<FieldDocument>::create(repo, &foreign), Err(DomainError::ValidationError(_))));
  let missing = FieldDocumentInput { user_id: a, activity_id: Some(act.id + 50), ..foreign };
  assert!(matches!(CrudRepository::<FieldDocument>::create(repo, &missing), Err(DomainError::ValidationError(_))));
  assert!(CrudRepository::<FieldDocument>::list(repo, &JournalFilter::default()).unwrap().is_empty());
}

#[test]
fn deleting_a_user_removes_everything_they_own() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let gone = user(repo, "baja@finca.es", Role::Agricultor);
  let stays = user(repo, "alta@finca.es", Role::Agricultor);
  let c1 = crop(repo, gone, "Olivo");
  let c2 = crop(repo, gone, "Almendro");
  let c3 = crop(repo, stays, "Olivo");
  fill_crop(repo, c1.id, 1);
  fill_crop(repo, c2.id, 2);
  fill_crop(repo, c3.id, 1);
  for uid in [gone, stays] {
    CrudRepository::<FieldDocument>::create(repo,
                                            &FieldDocumentInput { user_id: uid,
                                                                  activity_id: None,
                                                                  treatment_id: None,
                                                                  title: "Factura".into(),
                                                                  doc_type: None,
                                                                  file_path: Some(format!("uploads/{}.pdf", uid)),
                                                                  sha256: None }).unwrap();
  }

  let summary = repo.delete_user_cascade(gone).expect("user cascade");
  assert_eq!(summary.users, 1);
  assert_eq!(summary.crops, 2);
  assert_eq!(summary.irrigations, 3);
  assert_eq!(summary.documents, 1);
  assert_eq!(summary.released_files, vec![format!("uploads/{}.pdf", gone)]);

  assert!(repo.get_user(gone).unwrap().is_none());
  let left = CrudRepository::<Crop>::list(repo, &CropFilter::default()).unwrap();
  assert_eq!(left.len(), 1);
  assert_eq!(left[0].user_id, stays);
  assert_eq!(CrudRepository::<Irrigation>::list(repo, &RecordFilter::default()).unwrap().len(), 1);
  assert_eq!(CrudRepository::<FieldDocument>::list(repo, &JournalFilter::default()).unwrap().len(), 1);
}

#[test]
fn user_emails_are_unique_and_updates_are_partial() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let id = user(repo, "dup@finca.es", Role::Agricultor);
  let again = repo.create_user(&NewUserRecord { name: "Otro".into(),
                                                email: "dup@finca.es".into(),
                                                password_hash: "h".into(),
                                                role: Role::Agricultor });
  assert!(matches!(again, Err(DomainError::ValidationError(_))));

  let updated = repo.update_user(id, &UserChanges { role: Some(Role::Administrador), ..Default::default() })
                    .unwrap()
                    .expect("exists");
  assert_eq!(updated.role, Role::Administrador);
  assert_eq!(updated.email, "dup@finca.es");
  assert_eq!(repo.list_users(Some(Role::Administrador)).unwrap().len(), 1);

  let creds = repo.find_credentials_by_email("dup@finca.es").unwrap().expect("creds");
  assert_eq!(creds.password_hash, "$2b$04$hash");
  assert!(repo.update_user(id + 9, &UserChanges { name: Some("X".into()), ..Default::default() })
              .unwrap()
              .is_none());
}

#[test]
fn crop_filters_by_status_and_name() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let u = user(repo, "filtro@finca.es", Role::Agricultor);
  crop(repo, u, "Tomate cherry");
  crop(repo, u, "Tomate pera");
  crop(repo, u, "Lechuga");

  let tomatoes = CropFilter { name: Some("tomate".into()), ..Default::default() };
  assert_eq!(CrudRepository::<Crop>::list(repo, &tomatoes).unwrap().len(), 2);
  let harvested = CropFilter { status: Some(CropStatus::Cosechado), ..Default::default() };
  assert!(CrudRepository::<Crop>::list(repo, &harvested).unwrap().is_empty());

  let summary = CrudRepository::<Crop>::delete_where(repo, &tomatoes).unwrap();
  assert_eq!(summary.crops, 2);
  assert_eq!(CrudRepository::<Crop>::list(repo, &CropFilter::default()).unwrap().len(), 1);
}

/// Filas por tabla: cultivos, riegos, análisis, producciones, actividades,
/// tratamientos, documentos y usuarios.
fn row_counts(repo: &DieselRepository) -> [usize; 8] {
  [CrudRepository::<Crop>::list(repo, &CropFilter::default()).unwrap().len(),
   CrudRepository::<Irrigation>::list(repo, &RecordFilter::default()).unwrap().len(),
   CrudRepository::<SoilAnalysis>::list(repo, &RecordFilter::default()).unwrap().len(),
   CrudRepository::<Production>::list(repo, &RecordFilter::default()).unwrap().len(),
   CrudRepository::<FieldActivity>::list(repo, &JournalFilter::default()).unwrap().len(),
   CrudRepository::<FieldTreatment>::list(repo, &JournalFilter::default()).unwrap().len(),
   CrudRepository::<FieldDocument>::list(repo, &JournalFilter::default()).unwrap().len(),
   repo.list_users(None).unwrap().len()]
}

fn activity(repo: &DieselRepository, user_id: i32) -> FieldActivity {
  CrudRepository::<FieldActivity>::create(repo,
                                          &FieldActivityInput { user_id,
                                                                date: day(6),
                                                                activity_type: "Abonado".into(),
                                                                description: None,
                                                                plot: None }).expect("activity")
}

fn document(repo: &DieselRepository, user_id: i32, activity_id: Option<i32>) -> FieldDocument {
  CrudRepository::<FieldDocument>::create(repo,
                                          &FieldDocumentInput { user_id,
                                                                activity_id,
                                                                treatment_id: None,
                                                                title: "Albarán".into(),
                                                                doc_type: None,
                                                                file_path: Some(format!("uploads/{}.pdf", user_id)),
                                                                sha256: None }).expect("document")
}

fn assert_not_found(result: Result<agro_domain::DeleteSummary, DomainError>) {
  match result {
    Err(DomainError::NotFound(_)) => {}
    other => panic!("expected NotFound, got {:?}", other),
  }
}

#[test]
fn concurrent_cascades_wait_for_the_write_lock() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let u = user(repo, "hilos@finca.es", Role::Agricultor);

  let rounds = |t: usize| -> Result<(), String> {
    for round in 0..25 {
      let c = crop(repo, u, &format!("Cultivo {}-{}", t, round));
      let riego = IrrigationInput { crop_id: c.id,
                                    date: day(3),
                                    water_m3: 5.0,
                                    method: None,
                                    duration_min: None,
                                    notes: None };
      CrudRepository::<Irrigation>::create(repo, &riego).map_err(|e| format!("riego: {}", e))?;
      let summary = repo.delete_crop_cascade(c.id).map_err(|e| format!("cascada: {}", e))?;
      assert_eq!(summary.irrigations, 1);
    }
    Ok(())
  };
  std::thread::scope(|scope| {
    let workers: Vec<_> = (0..8).map(|t| scope.spawn(move || rounds(t))).collect();
    for worker in workers {
      worker.join().expect("worker panicked").expect("concurrent write failed");
    }
  });

  let counts = row_counts(repo);
  assert_eq!((counts[0], counts[1]), (0, 0));
}

#[test]
fn deleting_several_crops_removes_them_and_their_records() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let u = user(repo, "varios@finca.es", Role::Agricultor);
  let a = crop(repo, u, "Cebada");
  let b = crop(repo, u, "Trigo");
  let keep = crop(repo, u, "Avena");
  fill_crop(repo, a.id, 1);
  fill_crop(repo, b.id, 2);
  fill_crop(repo, keep.id, 1);

  let summary = repo.delete_crops_cascade(&[a.id, b.id]).expect("cascade");
  assert_eq!(summary.crops, 2);
  assert_eq!(summary.irrigations, 3);
  assert_eq!(summary.soil_analyses, 3);
  assert_eq!(summary.productions, 3);

  let left = CrudRepository::<Crop>::list(repo, &CropFilter::default()).unwrap();
  assert_eq!(left.iter().map(|c| c.id).collect::<Vec<_>>(), vec![keep.id]);
  assert_eq!(CrudRepository::<Irrigation>::list(repo, &RecordFilter::default()).unwrap().len(), 1);
}

#[test]
fn deleting_several_crops_with_a_missing_id_changes_nothing() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let u = user(repo, "falta@finca.es", Role::Agricultor);
  let a = crop(repo, u, "Girasol");
  let b = crop(repo, u, "Colza");
  fill_crop(repo, a.id, 1);
  fill_crop(repo, b.id, 1);
  let before = row_counts(repo);

  assert_not_found(repo.delete_crops_cascade(&[a.id, b.id + 100, b.id]));
  assert_eq!(row_counts(repo), before);
}

#[test]
fn deleting_all_crops_of_a_user_keeps_other_users_crops() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let owner = user(repo, "duena@finca.es", Role::Agricultor);
  let other = user(repo, "vecino@finca.es", Role::Agricultor);
  let c1 = crop(repo, owner, "Patata");
  let c2 = crop(repo, owner, "Cebolla");
  let kept = crop(repo, other, "Patata");
  fill_crop(repo, c1.id, 1);
  fill_crop(repo, c2.id, 1);
  fill_crop(repo, kept.id, 2);

  let summary = repo.delete_all_crops_of_user(owner).expect("user crops");
  assert_eq!(summary.crops, 2);
  assert_eq!(summary.productions, 2);
  let left = CrudRepository::<Crop>::list(repo, &CropFilter::default()).unwrap();
  assert_eq!(left.len(), 1);
  assert_eq!(left[0].user_id, other);
  assert_eq!(CrudRepository::<Irrigation>::list(repo, &by_crop(kept.id)).unwrap().len(), 2);

  // Sin cultivos no hay nada que borrar, y no es un error.
  let empty = repo.delete_all_crops_of_user(owner).expect("nothing left");
  assert!(empty.is_empty());
}

#[test]
fn filtered_crop_delete_only_touches_matching_crops() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let a = user(repo, "estado@finca.es", Role::Agricultor);
  let b = user(repo, "otro@finca.es", Role::Agricultor);
  let done = crop(repo, a, "Melón");
  crop(repo, a, "Sandía");
  crop(repo, b, "Calabaza");
  fill_crop(repo, done.id, 1);
  CrudRepository::<Crop>::update(repo,
                                 done.id,
                                 &CropInput { user_id: a,
                                              name: done.name.clone(),
                                              variety: None,
                                              plot: done.plot.clone(),
                                              area_ha: done.area_ha,
                                              sowing_date: done.sowing_date,
                                              expected_harvest_date: None,
                                              status: CropStatus::Cosechado }).unwrap()
                                 .expect("crop exists");

  let harvested = CropFilter { user_id: Some(a), status: Some(CropStatus::Cosechado), ..Default::default() };
  let summary = CrudRepository::<Crop>::delete_where(repo, &harvested).unwrap();
  assert_eq!(summary.crops, 1);
  assert_eq!(summary.irrigations, 1);
  assert!(CrudRepository::<Crop>::get(repo, done.id).unwrap().is_none());

  let only_user = CropFilter { user_id: Some(a), ..Default::default() };
  let summary = CrudRepository::<Crop>::delete_where(repo, &only_user).unwrap();
  assert_eq!(summary.crops, 1);
  let left = CrudRepository::<Crop>::list(repo, &CropFilter::default()).unwrap();
  assert_eq!(left.len(), 1);
  assert_eq!(left[0].user_id, b);
}

#[test]
fn deleting_a_missing_user_is_not_found_and_changes_nothing() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let u = user(repo, "sigue@finca.es", Role::Agricultor);
  let c = crop(repo, u, "Judía");
  fill_crop(repo, c.id, 1);
  document(repo, u, None);
  let before = row_counts(repo);

  assert_not_found(repo.delete_user_cascade(u + 100));
  assert_eq!(row_counts(repo), before);
}

#[test]
fn deleting_missing_records_is_not_found_and_changes_nothing() {
  if cfg!(feature = "pg") {
    return;
  }
  let db = TempDb::new();
  let repo = &db.repo;
  let u = user(repo, "registros@finca.es", Role::Agricultor);
  let c = crop(repo, u, "Guisante");
  fill_crop(repo, c.id, 1);
  let act = activity(repo, u);
  let doc = document(repo, u, Some(act.id));
  let before = row_counts(repo);

  let irrigation = CrudRepository::<Irrigation>::list(repo, &by_crop(c.id)).unwrap()[0].id;
  assert_not_found(CrudRepository::<Irrigation>::delete(repo, irrigation + 100));
  assert_not_found(CrudRepository::<FieldActivity>::delete(repo, act.id + 100));
  assert_not_found(CrudRepository::<FieldDocument>::delete(repo, doc.id + 100));
  assert_eq!(row_counts(repo), before);

  // El documento sigue enlazado a su actividad.
  let d = CrudRepository::<FieldDocument>::get(repo, doc.id).unwrap().expect("document survives");
  assert_eq!(d.activity_id, Some(act.id));
}
