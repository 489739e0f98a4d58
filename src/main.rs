use iced::widget::{button, column, container, row, scrollable, text};
use iced::{Alignment, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod gateway;
mod media;
mod state;
mod ui;

use config::AppConfig;
use gateway::{GatewayRequest, GeminiClient, PosterService, UnavailableService};
use media::codec::{load_product_images, ProductImage, IMAGE_EXTENSIONS};
use media::export::{export_to_dir, ExportQuality};
use state::{Intent, Session};
use ui::PreviewCache;

/// Main application state
struct PosterForge {
    /// Workflow state; only changed through `Session::reduce`
    session: Session,
    /// Image service every AI request goes to
    service: Arc<dyn PosterService>,
    config: AppConfig,
    /// Decoded handles for what the session shows
    previews: PreviewCache,
    /// Status line for things outside the workflow (file loads, exports)
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked "Choose Product Images"
    PickFiles,
    /// Background file load finished
    FilesLoaded(Result<Vec<ProductImage>, String>),
    /// Anything the workflow reducer handles
    Workflow(Intent),
    /// Export one saved poster at the given quality
    Export { id: String, quality: ExportQuality },
    ExportFinished(Result<PathBuf, String>),
}

impl PosterForge {
    fn new() -> (Self, Task<Message>) {
        let config = AppConfig::from_env();

        let service: Arc<dyn PosterService> = match GeminiClient::new(&config) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!(error = %e, "Image service unavailable; AI actions will fail");
                Arc::new(UnavailableService::new(e))
            }
        };

        let status = format!("Ready. Exports go to {}", config.export_dir.display());

        (
            PosterForge {
                session: Session::new(),
                service,
                config,
                previews: PreviewCache::new(),
                status,
            },
            Task::none(),
        )
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PickFiles => {
                if self.session.is_loading {
                    return Task::none();
                }

                let files = FileDialog::new()
                    .set_title("Select Product Images")
                    .add_filter("Images", &IMAGE_EXTENSIONS)
                    .pick_files();

                match files {
                    Some(paths) if !paths.is_empty() => {
                        self.status = format!("Loading {} file(s)...", paths.len());
                        Task::perform(load_product_images(paths), |result| {
                            Message::FilesLoaded(result.map_err(|e| e.to_string()))
                        })
                    }
                    _ => Task::none(),
                }
            }
            Message::FilesLoaded(Ok(images)) => {
                let count = images.len();
                let task = self.dispatch(Intent::SelectFiles(images));
                self.status = if self.session.has_deferred_upload() {
                    format!(
                        "Loaded {} product image(s); they replace the current upload once the running step finishes.",
                        count
                    )
                } else {
                    format!("Loaded {} product image(s).", count)
                };
                task
            }
            Message::FilesLoaded(Err(e)) => {
                warn!(error = %e, "File load failed");
                self.status = format!("Could not load images: {}", e);
                Task::none()
            }
            Message::Workflow(intent) => self.dispatch(intent),
            Message::Export { id, quality } => {
                let Some(image) = self.session.find_image(&id).cloned() else {
                    warn!(id = %id, "Export requested for unknown image");
                    return Task::none();
                };

                self.status = format!("Exporting {} at {}...", id, quality.label());
                Task::perform(
                    export_to_dir(image, quality, self.config.export_dir.clone()),
                    |result| Message::ExportFinished(result.map_err(|e| e.to_string())),
                )
            }
            Message::ExportFinished(Ok(path)) => {
                self.status = format!("Saved {}", path.display());
                Task::none()
            }
            Message::ExportFinished(Err(e)) => {
                error!(error = %e, "Export failed");
                self.status = format!("Export failed: {}", e);
                Task::none()
            }
        }
    }

    /// Feed an intent through the reducer and launch whatever it asks for
    ///
    /// Automatic follow-ups (the first concept suggestion after an upload)
    /// are applied in the same pass.
    fn dispatch(&mut self, intent: Intent) -> Task<Message> {
        let mut requests: Vec<GatewayRequest> = Vec::new();
        let mut next = Some(intent);

        while let Some(intent) = next.take() {
            if let Some(request) = self.session.reduce(intent) {
                requests.push(request);
            }
            next = self.session.automatic_intent();
        }

        self.previews.sync(&self.session);

        Task::batch(requests.into_iter().map(|request| {
            info!(operation = request.operation(), "Dispatching image service request");
            Task::perform(gateway::execute(self.service.clone(), request), |result| {
                Message::Workflow(Intent::Resolved(result))
            })
        }))
    }

    fn view(&self) -> Element<'_, Message> {
        let header = row![
            text("Poster Forge").size(28),
            text("AI product poster studio").size(14).color(ui::MUTED),
            iced::widget::horizontal_space(),
            button(text("Start Over"))
                .padding(8)
                .style(button::secondary)
                .on_press_maybe((!self.session.is_loading).then_some(Message::Workflow(Intent::Reset))),
        ]
        .spacing(12)
        .align_y(Alignment::Center);

        let banner: Element<'_, Message> = if self.session.is_loading {
            container(text(self.session.loading_message.as_str()).size(14).color(ui::ACCENT))
                .padding(8)
                .width(Length::Fill)
                .style(container::rounded_box)
                .into()
        } else {
            iced::widget::Space::with_height(Length::Fixed(0.0)).into()
        };

        let panels = row![
            scrollable(ui::control_panel::view(&self.session, &self.previews))
                .width(Length::FillPortion(3)),
            container(ui::workspace::view(&self.session, &self.previews))
                .width(Length::FillPortion(6))
                .height(Length::Fill),
            container(ui::finals_panel::view(&self.session, &self.previews))
                .width(Length::FillPortion(3))
                .height(Length::Fill),
        ]
        .spacing(16)
        .height(Length::Fill);

        let content = column![
            header,
            banner,
            panels,
            text(self.status.as_str()).size(12).color(ui::MUTED),
        ]
        .spacing(12)
        .padding(20);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("poster_forge=info")),
        )
        .init();

    info!("Starting Poster Forge");

    iced::application("Poster Forge", PosterForge::update, PosterForge::view)
        .theme(PosterForge::theme)
        .centered()
        .run_with(PosterForge::new)
}
