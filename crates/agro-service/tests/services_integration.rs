use agro_domain::{CropFilter, CropInput, CropStatus, DomainError, FieldActivityInput, FieldDocumentInput, IrrigationInput,
                  JournalFilter, NewUser, RecordFilter, Role, UserRepository, UserUpdate};
use agro_persistence::DieselRepository;
use agro_service::{AgroServices, AuthConfig, AuthService, DocumentStore, Session};
use chrono::NaiveDate;
use diesel::connection::SimpleConnection;
use diesel::Connection;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

struct Fixture {
  db: PathBuf,
  uploads: PathBuf,
  repo: Arc<DieselRepository>,
  svc: AgroServices<DieselRepository>,
}

impl Fixture {
  fn new() -> Self {
    let db = std::env::temp_dir().join(format!("agro_svc_{}.db", Uuid::new_v4()));
    let uploads = std::env::temp_dir().join(format!("agro_svc_uploads_{}", Uuid::new_v4()));
    let repo = Arc::new(DieselRepository::new(db.to_str().unwrap()).expect("repo"));
    let auth = Arc::new(AuthService::new(&AuthConfig { jwt_secret: "test".into(), token_ttl_hours: 1, bcrypt_cost: 4 })
                          .unwrap());
    let svc = AgroServices::new(repo.clone(), auth, DocumentStore::new(&uploads));
    Fixture { db, uploads, repo, svc }
  }

  fn farmer(&self, email: &str) -> Session {
    let u = self.svc
                .users
                .register(NewUser { name: "Agricultor".into(),
                                    email: email.into(),
                                    password: "secreto1".into(),
                                    role: Some(Role::Administrador) })
                .unwrap();
    Session::new(u.id, u.role)
  }

  fn admin(&self) -> Session {
    let u = self.svc.users.seed_admin("admin@finca.es", "admin123").unwrap().expect("seeded");
    Session::new(u.id, u.role)
  }

  fn crop(&self, s: &Session, name: &str) -> i32 {
    self.svc
        .crops
        .create(s,
                CropInput { user_id: 0,
                            name: name.into(),
                            variety: None,
                            plot: None,
                            area_ha: 1.0,
                            sowing_date: day(1),
                            expected_harvest_date: Some(day(20)),
                            status: CropStatus::Sembrado })
        .unwrap()
        .id
  }

  fn irrigate(&self, s: &Session, crop_id: i32) -> Result<i32, DomainError> {
    self.svc
        .irrigations
        .create(s,
                IrrigationInput { crop_id,
                                  date: day(3),
                                  water_m3: 5.0,
                                  method: None,
                                  duration_min: None,
                                  notes: None })
        .map(|i| i.id)
  }
}

impl Drop for Fixture {
  fn drop(&mut self) {
    let _ = std::fs::remove_file(&self.db);
    let _ = std::fs::remove_dir_all(&self.uploads);
  }
}

fn day(d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
}

#[test]
fn register_hashes_and_login_issues_matching_token() {
  if cfg!(feature = "pg") {
    return;
  }
  let f = Fixture::new();
  let s = f.farmer("Pepe@Finca.es ");
  // El registro público nunca concede el rol de administrador.
  assert_eq!(s.role, Role::Agricultor);

  let creds = f.repo.find_credentials_by_email("pepe@finca.es").unwrap().expect("stored");
  assert_ne!(creds.password_hash, "secreto1");

  let login = f.svc.users.login("PEPE@finca.es", "secreto1").unwrap();
  assert_eq!(login.user.id, s.user_id);
  let session = f.svc.users.authenticate(&login.token).unwrap();
  assert_eq!(session, s);

  assert!(matches!(f.svc.users.login("pepe@finca.es", "otra-clave"), Err(DomainError::Unauthorized(_))));
  assert!(matches!(f.svc.users.login("nadie@finca.es", "secreto1"), Err(DomainError::Unauthorized(_))));
}

#[test]
fn farmers_cannot_touch_each_others_rows() {
  if cfg!(feature = "pg") {
    return;
  }
  let f = Fixture::new();
  let a = f.farmer("a@finca.es");
  let b = f.farmer("b@finca.es");
  let crop_a = f.crop(&a, "Tomate");

  assert!(matches!(f.svc.crops.get(&b, crop_a), Err(DomainError::Forbidden(_))));
  assert!(matches!(f.svc.crops.delete(&b, crop_a), Err(DomainError::Forbidden(_))));
  assert!(matches!(f.irrigate(&b, crop_a), Err(DomainError::Forbidden(_))));
  assert!(matches!(f.irrigate(&a, crop_a + 40), Err(DomainError::NotFound(_))));
  assert!(f.irrigate(&a, crop_a).is_ok());

  // Aunque pida otro usuario, el agricultor crea a su nombre.
  let forged = f.svc
                .crops
                .create(&b,
                        CropInput { user_id: a.user_id,
                                    name: "Intruso".into(),
                                    variety: None,
                                    plot: None,
                                    area_ha: 1.0,
                                    sowing_date: day(1),
                                    expected_harvest_date: None,
                                    status: CropStatus::Planificado })
                .unwrap();
  assert_eq!(forged.user_id, b.user_id);

  assert_eq!(f.svc.crops.list(&b, CropFilter { user_id: Some(a.user_id), ..Default::default() }).unwrap().len(), 1);
  assert_eq!(f.svc.irrigations.list(&b, RecordFilter::default()).unwrap().len(), 0);
}

#[test]
fn farmer_delete_all_only_removes_own_rows() {
  if cfg!(feature = "pg") {
    return;
  }
  let f = Fixture::new();
  let admin = f.admin();
  let a = f.farmer("a@finca.es");
  let b = f.farmer("b@finca.es");
  for name in ["Trigo", "Cebada"] {
    let c = f.crop(&a, name);
    f.irrigate(&a, c).unwrap();
  }
  let cb = f.crop(&b, "Maíz");
  f.irrigate(&b, cb).unwrap();

  let summary = f.svc.crops.delete_all(&a).unwrap();
  assert_eq!(summary.crops, 2);
  assert_eq!(summary.irrigations, 2);

  let left = f.svc.crops.list(&admin, CropFilter::default()).unwrap();
  assert_eq!(left.len(), 1);
  assert_eq!(left[0].user_id, b.user_id);
  assert_eq!(f.svc.irrigations.list(&admin, RecordFilter::default()).unwrap().len(), 1);
}

#[test]
fn validation_errors_reach_the_caller() {
  if cfg!(feature = "pg") {
    return;
  }
  let f = Fixture::new();
  let a = f.farmer("v@finca.es");
  let bad = CropInput { user_id: 0,
                        name: "Tomate".into(),
                        variety: None,
                        plot: None,
                        area_ha: -1.0,
                        sowing_date: day(10),
                        expected_harvest_date: Some(day(2)),
                        status: CropStatus::Sembrado };
  assert!(matches!(f.svc.crops.create(&a, bad), Err(DomainError::ValidationError(_))));
  assert!(matches!(f.svc.users.register(NewUser { name: "X".into(),
                                                  email: "no-es-email".into(),
                                                  password: "secreto1".into(),
                                                  role: None }),
                   Err(DomainError::ValidationError(_))));
}

#[test]
fn users_manage_themselves_and_admin_manages_all() {
  if cfg!(feature = "pg") {
    return;
  }
  let f = Fixture::new();
  let admin = f.admin();
  let a = f.farmer("a@finca.es");
  let b = f.farmer("b@finca.es");

  assert!(f.svc.users.list(&a, None).is_err());
  assert!(matches!(f.svc.users.get(&a, b.user_id), Err(DomainError::Forbidden(_))));
  let promote = UserUpdate { role: Some(Role::Administrador), ..Default::default() };
  assert!(matches!(f.svc.users.update(&a, a.user_id, promote.clone()), Err(DomainError::Forbidden(_))));
  assert_eq!(f.svc.users.update(&admin, a.user_id, promote).unwrap().role, Role::Administrador);

  let renamed = f.svc
                 .users
                 .update(&b, b.user_id, UserUpdate { name: Some("Berta".into()), ..Default::default() })
                 .unwrap();
  assert_eq!(renamed.name, "Berta");
  assert!(f.svc.users.seed_admin("admin@finca.es", "admin123").unwrap().is_none());

  f.crop(&b, "Olivo");
  let summary = f.svc.delete_all_users(&admin).unwrap();
  assert_eq!(summary.users, 2);
  assert_eq!(summary.crops, 1);
  assert_eq!(f.svc.users.list(&admin, None).unwrap().len(), 1);
}

#[test]
fn uploaded_documents_keep_their_file_until_deleted() {
  if cfg!(feature = "pg") {
    return;
  }
  let f = Fixture::new();
  let a = f.farmer("doc@finca.es");
  let act = f.svc
             .activities
             .create(&a,
                     FieldActivityInput { user_id: 0,
                                          date: day(5),
                                          activity_type: "Abonado".into(),
                                          description: None,
                                          plot: None })
             .unwrap();
  let input = FieldDocumentInput { user_id: 0,
                                   activity_id: Some(act.id),
                                   treatment_id: None,
                                   title: "Albarán".into(),
                                   doc_type: Some("albaran".into()),
                                   file_path: None,
                                   sha256: None };
  let doc = f.svc.upload_document(&a, input.clone(), "albaran.pdf", b"%PDF-1.4").unwrap();
  assert!(doc.sha256.is_some());

  // Cambiar los metadatos no pierde el fichero.
  let updated = f.svc.documents.update(&a, doc.id, FieldDocumentInput { title: "Albarán 12".into(), ..input }).unwrap();
  assert_eq!(updated.file_path, doc.file_path);
  let (_, bytes) = f.svc.document_file(&a, doc.id).unwrap();
  assert_eq!(bytes, b"%PDF-1.4");

  let csv = f.svc.export_journal(&a, JournalFilter::default()).unwrap();
  assert!(csv.contains("Abonado"));

  let summary = f.svc.documents.delete(&a, doc.id).unwrap();
  f.svc.release_files(&summary);
  let path = doc.file_path.unwrap();
  assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn failed_bulk_user_delete_still_releases_committed_files() {
  if cfg!(feature = "pg") {
    return;
  }
  let f = Fixture::new();
  let admin = f.admin();
  let a = f.farmer("primero@finca.es");
  f.farmer("bloqueado@finca.es");
  let input = FieldDocumentInput { user_id: 0,
                                   activity_id: None,
                                   treatment_id: None,
                                   title: "Factura".into(),
                                   doc_type: None,
                                   file_path: None,
                                   sha256: None };
  let doc = f.svc.upload_document(&a, input, "factura.pdf", b"%PDF-1.4").unwrap();
  let path = doc.file_path.clone().unwrap();
  assert!(std::path::Path::new(&path).exists());

  let mut raw = diesel::SqliteConnection::establish(f.db.to_str().unwrap()).expect("raw conn");
  raw.batch_execute("CREATE TRIGGER block_user_delete BEFORE DELETE ON users \
                     WHEN OLD.email = 'bloqueado@finca.es' \
                     BEGIN SELECT RAISE(ABORT, 'bloqueado'); END;")
     .expect("trigger");

  let err = f.svc.delete_all_users(&admin).expect_err("second user must fail");
  assert!(matches!(err, DomainError::StorageError(_)), "{err:?}");

  // El primer usuario ya se confirmó: su fichero no puede quedar huérfano.
  assert!(!std::path::Path::new(&path).exists());
  assert!(f.repo.get_user(a.user_id).unwrap().is_none());
  assert_eq!(f.svc.users.list(&admin, None).unwrap().len(), 2);
}

#[test]
fn bulk_crop_delete_is_scoped_to_the_farmer() {
  let f = Fixture::new();
  let a = f.farmer("masivo@finca.es");
  let b = f.farmer("ajeno@finca.es");
  let own = f.crop(&a, "Tomate");
  f.irrigate(&a, own).unwrap();
  f.crop(&b, "Tomate");

  let harvested = CropFilter { status: Some(CropStatus::Cosechado), ..Default::default() };
  let none = f.svc.crops.delete_by_filter(&a, harvested).unwrap();
  assert!(none.is_empty());

  let summary = f.svc.crops.delete_all(&a).unwrap();
  assert_eq!(summary.crops, 1);
  assert_eq!(summary.irrigations, 1);
  assert!(f.svc.crops.list(&a, CropFilter::default()).unwrap().is_empty());
  assert_eq!(f.svc.crops.list(&b, CropFilter::default()).unwrap().len(), 1);
}
