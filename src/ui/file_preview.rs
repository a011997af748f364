use gtk::prelude::*;
use relm4::prelude::*;

use crate::models::FileRef;
use crate::services::FilePreview;

/// Modal card over the chat area showing one document's excerpt and its
/// Drive links.
pub struct FilePreviewView {
    state: FilePreview,
}

#[derive(Debug)]
pub enum FilePreviewMsg {
    Open(FileRef),
    Close,
    /// Primary click on the overlay; `true` when it landed inside the card.
    BackdropClicked(bool),
    OpenInDrive,
    Download,
}

#[derive(Debug)]
pub enum FilePreviewOutput {
    OpenUri(String),
}

#[relm4::component(pub)]
impl Component for FilePreviewView {
    type Init = ();
    type Input = FilePreviewMsg;
    type Output = FilePreviewOutput;
    type CommandOutput = ();

    view! {
        gtk::Box {
            set_hexpand: true,
            set_vexpand: true,
            add_css_class: "preview-backdrop",
            #[watch]
            set_visible: model.state.is_open(),

            gtk::Box {
                set_orientation: gtk::Orientation::Vertical,
                set_spacing: 12,
                set_hexpand: true,
                set_halign: gtk::Align::Center,
                set_valign: gtk::Align::Center,
                set_width_request: 520,
                add_css_class: "card",
                add_css_class: "preview-card",

                gtk::Box {
                    set_orientation: gtk::Orientation::Horizontal,
                    set_spacing: 12,
                    set_margin_top: 12,
                    set_margin_start: 16,
                    set_margin_end: 8,

                    gtk::Image {
                        set_icon_name: Some("x-office-document-symbolic"),
                        set_pixel_size: 32,
                    },

                    gtk::Box {
                        set_orientation: gtk::Orientation::Vertical,
                        set_hexpand: true,

                        gtk::Label {
                            set_halign: gtk::Align::Start,
                            set_ellipsize: gtk::pango::EllipsizeMode::Middle,
                            add_css_class: "heading",
                            #[watch]
                            set_label: model.state.subject().map(|f| f.filename.as_str()).unwrap_or_default(),
                        },
                        gtk::Label {
                            set_label: "Dokumen PDF",
                            set_halign: gtk::Align::Start,
                            add_css_class: "dim-label",
                            add_css_class: "caption",
                        },
                    },

                    gtk::Button {
                        set_icon_name: "window-close-symbolic",
                        set_tooltip_text: Some("Tutup (Esc)"),
                        set_valign: gtk::Align::Start,
                        add_css_class: "flat",
                        add_css_class: "circular",
                        connect_clicked => FilePreviewMsg::Close,
                    },
                },

                gtk::Label {
                    set_label: "Preview Dokumen",
                    set_halign: gtk::Align::Start,
                    set_margin_start: 16,
                    add_css_class: "caption-heading",
                },

                gtk::ScrolledWindow {
                    set_hscrollbar_policy: gtk::PolicyType::Never,
                    set_max_content_height: 300,
                    set_propagate_natural_height: true,
                    set_margin_start: 16,
                    set_margin_end: 16,
                    add_css_class: "preview-text",

                    gtk::Label {
                        set_halign: gtk::Align::Start,
                        set_valign: gtk::Align::Start,
                        set_xalign: 0.0,
                        set_wrap: true,
                        set_wrap_mode: gtk::pango::WrapMode::WordChar,
                        set_selectable: true,
                        set_margin_all: 8,
                        #[watch]
                        set_label: model.state.preview_text().unwrap_or_default(),
                    },
                },

                gtk::Box {
                    set_orientation: gtk::Orientation::Horizontal,
                    set_spacing: 8,
                    set_homogeneous: true,
                    set_margin_start: 16,
                    set_margin_end: 16,
                    set_margin_bottom: 16,

                    gtk::Button {
                        set_label: "Buka di Google Drive",
                        add_css_class: "suggested-action",
                        connect_clicked => FilePreviewMsg::OpenInDrive,
                    },
                    gtk::Button {
                        set_label: "Download",
                        connect_clicked => FilePreviewMsg::Download,
                    },
                },
            },
        }
    }

    fn init(
        _init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let model = Self {
            state: FilePreview::new(),
        };
        let widgets = view_output!();

        // Only a click whose deepest target is the backdrop itself dismisses.
        let gesture = gtk::GestureClick::new();
        gesture.set_button(1); // primary
        let backdrop = root.clone();
        let sender_click = sender.clone();
        gesture.connect_released(move |_, _, x, y| {
            let inside = backdrop
                .pick(x, y, gtk::PickFlags::DEFAULT)
                .is_some_and(|target| &target != backdrop.upcast_ref::<gtk::Widget>());
            sender_click.input(FilePreviewMsg::BackdropClicked(inside));
        });
        root.add_controller(gesture);

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>, _root: &Self::Root) {
        match msg {
            FilePreviewMsg::Open(file) => {
                tracing::debug!("Previewing {}", file.filename);
                self.state.open(file);
            }
            FilePreviewMsg::Close => {
                self.state.close();
            }
            FilePreviewMsg::BackdropClicked(inside) => {
                self.state.backdrop_clicked(inside);
            }
            FilePreviewMsg::OpenInDrive => {
                if let Some(url) = self.state.open_url() {
                    let _ = sender.output(FilePreviewOutput::OpenUri(url.to_string()));
                }
            }
            FilePreviewMsg::Download => {
                if let Some(url) = self.state.download_url() {
                    let _ = sender.output(FilePreviewOutput::OpenUri(url.to_string()));
                }
            }
        }
    }
}
