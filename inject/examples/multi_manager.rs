use fibre_inject::{create_manager, default_manager, depends, Overrides, Provider, Result};

fn main() -> Result<()> {
  let region = Provider::new(|| String::from("eu-west-1"));
  let local_region = Provider::new(|| String::from("local"));

  let isolated = create_manager();
  let _scope = isolated.override_scope(Overrides::new().replace(&region, &local_region));

  println!("isolated: {}", isolated.resolve(&depends(&region))?);
  println!("default:  {}", default_manager().resolve(&depends(&region))?);

  assert!(!default_manager().is_overridden(&region));
  println!("\nVerified that overrides on one manager do not leak into another.");
  Ok(())
}
