//! Registration form handling for Projeto Air.
//!
//! The registration page carries one form with personal data and a
//! contribution mode. This crate binds that form to a typed
//! [`FormSchema`], validates its values ([`Validator`]), shows inline
//! feedback ([`Presenter`]) and transient messages ([`show_message`]), and
//! stores valid registrations ([`RegistrationForm::submit`]).

mod flash;
mod presenter;
mod schema;
mod submit;
mod validator;

pub use flash::{FlashKind, show_message};
pub use presenter::Presenter;
pub use schema::{FieldRef, FormSchema, FormValues};
pub use submit::{RegistrationForm, SubmitError, SubmitOutcome};
pub use validator::{FormData, ValidationReport, Validator, Violation, age_in_years};

/// The registration form as the site ships it.
#[cfg(test)]
pub(crate) const TEST_FORM: &str = r##"
<main><form action="#">
  <input id="nome" value="">
  <input name="email" value="">
  <input id="contato">
  <input id="nascimento" type="date">
  <select id="uf"><option value="">--</option><option value="SP">SP</option></select>
  <select id="formaContribuicao">
    <option value="">--</option><option value="voluntario">V</option><option value="doador">D</option>
  </select>
  <div id="opcaoVoluntario">
    <input type="checkbox" value="educacao"><input type="checkbox" value="eventos">
  </div>
  <div id="opcaoDoador">
    <input type="radio" name="metodo" value="pix"><input type="radio" name="metodo" value="boleto">
  </div>
</form></main>"##;
