use crate::infra::{
    InMemoryEmployerRepository, InMemoryIdentityProvider, InMemoryProfileStore, LoggingNotifier,
};
use clap::Args;
use employer_network::access::{Actor, Gatekeeper, Role};
use employer_network::config::AccountsConfig;
use employer_network::error::AppError;
use employer_network::workflows::accounts::{
    AccountProvisioningService, Credentials, InviteRequest, LinkRedemption, PasswordChange,
};
use employer_network::workflows::employers::{
    EmployerDirectoryService, EmployerListing, EmployerPatch, EmployerSubmission, ListingRequest,
};
use std::sync::Arc;

const DEMO_PUBLIC_URL: &str = "http://127.0.0.1:3000";
const DEMO_PASSWORD: &str = "demo-password-1";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Email used for the first-run administrator.
    #[arg(long, default_value = "admin@agency.example")]
    pub(crate) admin_email: String,
    /// Listing sort column (created_at, company_name, address_city, address_county, industry).
    #[arg(long)]
    pub(crate) sort: Option<String>,
    /// Listing direction (asc or desc).
    #[arg(long)]
    pub(crate) order: Option<String>,
}

type DemoAccounts = AccountProvisioningService<InMemoryIdentityProvider, InMemoryProfileStore>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let identity = Arc::new(InMemoryIdentityProvider::default());
    let profiles = Arc::new(InMemoryProfileStore::default());
    let notifier = Arc::new(LoggingNotifier::new("Employer Network <demo@example.org>"));
    let accounts = AccountProvisioningService::new(
        identity.clone(),
        profiles.clone(),
        AccountsConfig::new(DEMO_PUBLIC_URL),
    );
    let directory = EmployerDirectoryService::new(
        Arc::new(InMemoryEmployerRepository::default()),
        profiles.clone(),
        notifier.clone(),
    );
    let gate = Gatekeeper::new(identity.clone(), profiles);

    println!("=== Employer Network Demo ===");

    let admin = accounts.bootstrap(&Credentials {
        email: args.admin_email.clone(),
        password: DEMO_PASSWORD.to_string(),
    })?;
    println!("\n-- First-run setup --");
    println!("Administrator: {} ({})", admin.email, admin.role.label());
    let admin = Actor {
        id: admin.id,
        email: admin.email,
        role: admin.role,
    };

    println!("\n-- Staff invitations --");
    let mut staff = Vec::new();
    for (email, name, role) in [
        ("crs@agency.example", "Casey Rivera", Role::Crs),
        ("es@agency.example", "Jordan Lee", Role::EmploymentSpecialist),
        ("director@agency.example", "Morgan Diaz", Role::Director),
    ] {
        let outcome = accounts.invite(
            &admin,
            &InviteRequest {
                email: email.to_string(),
                full_name: Some(name.to_string()),
                role: Some(role.as_str().to_string()),
            },
        )?;
        println!(
            "Invited {} as {}",
            outcome.profile.email,
            outcome.profile.role.label()
        );
        staff.push(accept_invite(&accounts, &identity, &gate, email)?);
    }
    if let Err(err) = accounts.invite(
        &admin,
        &InviteRequest {
            email: "second-admin@agency.example".to_string(),
            full_name: None,
            role: Some(Role::Admin.as_str().to_string()),
        },
    ) {
        println!("Admin invite refused: {err}");
    }

    println!("\n-- Public submissions --");
    let mut submitted = Vec::new();
    for (company, city, industry) in [
        ("Riverside Hotel", "Des Moines", "Hospitality"),
        ("Prairie Logistics", "Ames", "Warehousing"),
        ("Cedar Valley Foods", "Cedar Rapids", "Food Service"),
    ] {
        let employer = directory.submit(submission(company, city, industry))?;
        println!(
            "Received {} ({}) -> {}",
            employer.company_name, employer.address_city, employer.status
        );
        submitted.push(employer);
    }
    println!("CRS notifications dispatched: {}", notifier.sent().len());

    let crs = &staff[0];
    println!("\n-- CRS review --");
    for employer in submitted.iter().take(2) {
        let promoted = directory.update(
            crs,
            &employer.id,
            &EmployerPatch {
                status: Some("Active Partner".to_string()),
                ..EmployerPatch::default()
            },
        )?;
        println!("{} promoted to {}", promoted.company_name, promoted.status);
    }

    if let Some(employer) = submitted.first() {
        match directory.geocode(&admin, &employer.id) {
            Ok(point) => println!(
                "{} located at {:.4}, {:.4}",
                employer.company_name, point.latitude, point.longitude
            ),
            Err(err) => println!("Geocoding skipped: {err}"),
        }
    }

    let request = ListingRequest {
        sort: args.sort,
        order: args.order,
    };
    println!("\n-- Listings by role --");
    print_listing("Admin", &directory.list(&admin, &request)?);
    for actor in &staff {
        print_listing(actor.role.label(), &directory.list(actor, &request)?);
    }

    if let Some(employer) = submitted.last() {
        let specialist = &staff[1];
        if let Err(err) = directory.delete(specialist, &employer.id) {
            println!("\nEmployment Specialist delete refused: {err}");
        }
        directory.delete(&admin, &employer.id)?;
        println!("Admin removed {}", employer.company_name);
    }

    println!("\n-- Staff roster --");
    for profile in accounts.list_users(&admin)? {
        println!(
            "- {:<28} {:<32} {}",
            profile.email,
            profile.role.label(),
            profile.full_name.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

fn accept_invite(
    accounts: &DemoAccounts,
    identity: &InMemoryIdentityProvider,
    gate: &Gatekeeper<InMemoryIdentityProvider, InMemoryProfileStore>,
    email: &str,
) -> Result<Actor, AppError> {
    let code = identity
        .outbox()
        .into_iter()
        .rev()
        .find(|link| link.email == email)
        .map(|link| link.code)
        .unwrap_or_default();
    let redeemed = accounts.redeem_link(&LinkRedemption {
        code,
        next: Some("/reset-password".to_string()),
    })?;
    accounts.set_password(
        Some(&redeemed.session.access_token),
        &PasswordChange {
            password: DEMO_PASSWORD.to_string(),
            confirmation: DEMO_PASSWORD.to_string(),
        },
    )?;
    let session = accounts.sign_in(&Credentials {
        email: email.to_string(),
        password: DEMO_PASSWORD.to_string(),
    })?;
    println!("  {email} accepted the invite and signed in");
    Ok(gate.resolve(Some(&session.access_token))?)
}

fn submission(company: &str, city: &str, industry: &str) -> EmployerSubmission {
    EmployerSubmission {
        company_name: Some(company.to_string()),
        address_street: Some("100 Main St".to_string()),
        address_city: Some(city.to_string()),
        address_state: Some("IA".to_string()),
        address_county: Some("Polk".to_string()),
        industry: Some(industry.to_string()),
        contact_name: Some("Pat Quinn".to_string()),
        contact_email: Some(format!(
            "hiring@{}.example",
            company.to_ascii_lowercase().replace(' ', "-")
        )),
        ..EmployerSubmission::default()
    }
}

fn print_listing(viewer: &str, listing: &EmployerListing) {
    println!(
        "{viewer} ({} {}): {} employer(s)",
        listing.sort.as_str(),
        listing.order.as_str(),
        listing.employers.len()
    );
    for employer in &listing.employers {
        println!(
            "  - {:<22} {:<14} {}",
            employer.company_name, employer.address_city, employer.status
        );
    }
}
