use actix_web::web;

pub mod dashboard;
pub mod donation;
pub mod extra_work;
pub mod files;
pub mod milestone;
pub mod petty_cash;
pub mod report;
pub mod schedule;
pub mod site;
pub mod supply;

/// Registers every endpoint. Literal segments are registered before the
/// `{id}` patterns that would otherwise shadow them.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(files::get_file)
        .service(site::get_sites)
        .service(site::create_site)
        .service(site::get_site)
        .service(site::update_site_targets)
        .service(schedule::get_schedule)
        .service(schedule::create_schedule_item)
        .service(schedule::approve_schedule_item)
        .service(schedule::update_schedule_item)
        .service(schedule::delete_schedule_item)
        .service(report::get_report_authors)
        .service(report::get_reports)
        .service(report::create_report)
        .service(report::clear_reports)
        .service(report::upload_photos)
        .service(report::share_report)
        .service(milestone::get_milestones)
        .service(milestone::create_milestone)
        .service(milestone::mark_milestone_paid)
        .service(milestone::update_milestone)
        .service(milestone::delete_milestone)
        .service(donation::get_donation_summary)
        .service(donation::get_donations)
        .service(donation::create_donation)
        .service(donation::update_donation)
        .service(donation::delete_donation)
        .service(petty_cash::get_balance)
        .service(petty_cash::get_movements)
        .service(petty_cash::create_movement)
        .service(petty_cash::approve_movement)
        .service(petty_cash::reject_movement)
        .service(petty_cash::attach_receipt)
        .service(supply::get_supplies)
        .service(supply::create_supply)
        .service(supply::update_supply)
        .service(supply::delete_supply)
        .service(extra_work::get_extra_work_summary)
        .service(extra_work::get_extra_works)
        .service(extra_work::create_extra_work)
        .service(extra_work::advance_extra_work)
        .service(extra_work::update_extra_work)
        .service(extra_work::delete_extra_work)
        .service(dashboard::get_curve)
        .service(dashboard::get_kpis);
}
