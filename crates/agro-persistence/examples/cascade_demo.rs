use agro_domain::{Crop, CropInput, CropRepository, CropStatus, CrudRepository, Irrigation, IrrigationInput,
                  NewUserRecord, Role, UserRepository};
use agro_persistence::new_from_env;
use chrono::NaiveDate;

fn main() {
  // Usa AGRO_DB_URL / DATABASE_URL; sin ellas (y sin `pg`) crea agro.db
  // en el directorio actual.
  let repo = new_from_env().expect("no se pudo inicializar el repositorio");

  let user = repo.create_user(&NewUserRecord { name: "Demo".into(),
                                               email: format!("demo{}@finca.es", std::process::id()),
                                               password_hash: "sin-login".into(),
                                               role: Role::Agricultor })
                 .expect("usuario");

  let sowing = NaiveDate::from_ymd_opt(2025, 3, 1).expect("fecha");
  let crop = CrudRepository::<Crop>::create(&repo,
                                            &CropInput { user_id: user.id,
                                                         name: "Tomate".into(),
                                                         variety: Some("Raf".into()),
                                                         plot: Some("Parcela 4".into()),
                                                         area_ha: 1.5,
                                                         sowing_date: sowing,
                                                         expected_harvest_date: None,
                                                         status: CropStatus::Sembrado }).expect("cultivo");
  println!("cultivo {} creado", crop.id);

  for d in 1..=3 {
    CrudRepository::<Irrigation>::create(&repo,
                                         &IrrigationInput { crop_id: crop.id,
                                                            date: sowing + chrono::Days::new(d * 7),
                                                            water_m3: 12.0,
                                                            method: Some("goteo".into()),
                                                            duration_min: Some(45),
                                                            notes: None }).expect("riego");
  }

  let summary = repo.delete_crop_cascade(crop.id).expect("borrado");
  println!("borrado en cascada: {} cultivo(s), {} riego(s)", summary.crops, summary.irrigations);

  repo.delete_user_cascade(user.id).expect("borrar usuario");
}
